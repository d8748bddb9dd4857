//! Deterministic canned replies for running without a model.
//!
//! Topics are detected over everything the counterpart has said, but a topic
//! only drives the reply if the latest message also touches it. The reply
//! within a topic rotates with transcript length so repeated turns vary.

use async_trait::async_trait;

use super::{ReplyContext, ReplyGenerator};
use crate::error::LlmError;

struct Topic {
    name: &'static str,
    cues: &'static [&'static str],
    replies: &'static [&'static str],
}

/// Highest priority first.
const TOPICS: &[Topic] = &[
    Topic {
        name: "threat",
        cues: &["cyber cell", "income tax", "legal action", "court", "arrest", "police", "complaint filed"],
        replies: &[
            "I have not done anything illegal. Which office are you calling from?",
            "If there is a case against me, send the official notice by post.",
            "Why would the police message me like this? Give me your badge number.",
            "I am going to call the local station and check this myself.",
        ],
    },
    Topic {
        name: "security",
        cues: &["otp", "password", " pin", "cvv", "secure code", "2fa"],
        replies: &[
            "My bank says never share the OTP. Why do you need it?",
            "I cannot give my password to anyone. Is there another way?",
            "How do I know you will not misuse my PIN?",
            "The app warns me about exactly this kind of request.",
        ],
    },
    Topic {
        name: "payment",
        cues: &["transfer", "payment", "upi", "rupees", "amount", "pay ", "processing fee", "send money"],
        replies: &[
            "Why should I send money to fix my own account?",
            "Whose account is this money going to? What is the name on it?",
            "Can you give me a reference number for this payment first?",
            "My bank never asked me to pay through UPI before. Which ID exactly?",
        ],
    },
    Topic {
        name: "personal_info",
        cues: &["account number", "debit card", "credit card", "date of birth", "details", "personal"],
        replies: &[
            "Why do you need my details? You should already have them.",
            "I am not comfortable sharing that with someone I do not know.",
            "Can you first tell me your employee ID and branch?",
            "What will you do with this information?",
        ],
    },
    Topic {
        name: "link",
        cues: &["click", "link", "http", "www.", "bit.ly", "website"],
        replies: &[
            "Is this link safe? It does not look like my bank's site.",
            "Can you just tell me the steps instead of sending a link?",
            "The link is not opening on my phone. What is the full address?",
            "Who owns this website? Let me check it first.",
        ],
    },
    Topic {
        name: "suspension",
        cues: &["blocked", "suspended", "freeze", "frozen", "deactivate", "locked", "disabled"],
        replies: &[
            "Blocked? I used my account this morning. Why would it be blocked?",
            "Nobody from my branch told me anything about this.",
            "What is the reference number for the block?",
            "I do not see any alert in my banking app.",
        ],
    },
    Topic {
        name: "urgency",
        cues: &["immediately", "urgent", "asap", "today", "hurry", "expires", "24 hours"],
        replies: &[
            "Why is it so urgent? Give me some time to check.",
            "You are rushing me and that makes me nervous.",
            "What happens if I do it tomorrow instead?",
            "If it is that urgent I will go to the branch directly.",
        ],
    },
    Topic {
        name: "kyc",
        cues: &["kyc", "verification", "verify", "aadhaar", "update profile"],
        replies: &[
            "What exactly needs updating? I did my KYC last year.",
            "I never got any KYC notice from the bank.",
            "Can I update it at the branch instead?",
            "Which documents do you need and where do I send them?",
        ],
    },
    Topic {
        name: "refund",
        cues: &["refund", "package", "parcel", "courier", "customs", "delivery"],
        replies: &[
            "Which order is this refund for? I did not order anything recently.",
            "Why would I pay a fee to get my own refund?",
            "Give me the tracking number and I will check with the courier.",
            "Customs? I was not expecting any parcel.",
        ],
    },
    Topic {
        name: "prize",
        cues: &["congratulations", "lottery", "prize", "lucky draw", "winner", "kbc"],
        replies: &[
            "I never entered any contest. How did I win?",
            "Which company is giving this prize? Send me their details.",
            "Why do I have to pay to receive a prize?",
            "Who told you my number for this draw?",
        ],
    },
    Topic {
        name: "loan",
        cues: &["loan", "pre-approved", "instant credit", "credit limit"],
        replies: &[
            "I never applied for a loan. Who approved it?",
            "Why is there a fee before the loan is even given?",
            "Which bank is this loan from? Send me the sanction letter.",
            "What is the interest rate and the tenure?",
        ],
    },
    Topic {
        name: "job",
        cues: &["job", "work from home", "part time", "part-time", "hiring", "salary"],
        replies: &[
            "I did not apply for any job. Which company is this?",
            "What is the actual work? Nobody pays this much for nothing.",
            "Is there an interview first? Who will I report to?",
            "Send me the company website so I can check.",
        ],
    },
    Topic {
        name: "investment",
        cues: &["investment", "crypto", "bitcoin", "double", "returns", "profit", "trading"],
        replies: &[
            "Guaranteed returns? That sounds too good to be true.",
            "Is this registered with SEBI? Send me the registration number.",
            "How long have you been running this scheme?",
            "Who else has invested? Can I talk to one of them?",
        ],
    },
];

const OPENING_REPLIES: &[&str] = &[
    "Sorry, I don't understand. Who is this?",
    "This seems strange. How did you get my number?",
    "Which bank are you calling from?",
];

const EARLY_REPLIES: &[&str] = &[
    "I still have doubts. Can you explain more?",
    "How can I be sure this is real?",
    "Let me check before I do anything.",
];

const LATE_REPLIES: &[&str] = &[
    "Okay, but I need some proof first.",
    "Let me confirm this with my bank.",
    "What happens if I don't do this right now?",
    "Can you send something official in writing?",
];

fn mentions(text: &str, topic: &Topic) -> bool {
    topic.cues.iter().any(|cue| text.contains(cue))
}

fn pick(replies: &'static [&'static str], turn: usize) -> &'static str {
    replies[turn.saturating_sub(1) % replies.len()]
}

/// Reply for this context and the topic that produced it, if any.
pub fn scripted_reply(ctx: &ReplyContext) -> (Option<&'static str>, &'static str) {
    let turn = ctx.transcript.len();
    let conversation = ctx.counterpart_text().to_lowercase();
    let latest = ctx.last_counterpart_text().unwrap_or_default().to_lowercase();

    let topic = TOPICS
        .iter()
        .find(|t| mentions(&conversation, t) && mentions(&latest, t));
    if let Some(topic) = topic {
        return (Some(topic.name), pick(topic.replies, turn));
    }

    let generic = match turn {
        0..=1 => OPENING_REPLIES,
        2..=3 => EARLY_REPLIES,
        _ => LATE_REPLIES,
    };
    (None, pick(generic, turn))
}

/// Offline generator. Never fails.
pub struct ScriptedReplyGenerator;

#[async_trait]
impl ReplyGenerator for ScriptedReplyGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, ctx: &ReplyContext) -> Result<String, LlmError> {
        let (topic, reply) = scripted_reply(ctx);
        tracing::debug!(
            session_id = %ctx.session_id,
            topic = topic.unwrap_or("none"),
            turn = ctx.transcript.len(),
            "Scripted reply"
        );
        Ok(reply.to_string())
    }
}
