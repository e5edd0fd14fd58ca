//! Rule-based responder — keyword lookup for LLM-less deployments.
//!
//! DESIGN
//! ======
//! An ordered table of (keywords, reply) pairs scanned top to bottom; the
//! first rule with a keyword present in the message wins, and a default
//! coaching reply covers everything else. Matching is case-insensitive and
//! word-based so "hi" never fires inside "think". Stateless by construction:
//! no profile, no history, no clock.

// Order matters: earlier rules shadow later ones for mixed messages.
const RULES: &[(&[&str], &str)] = &[
    (
        &["hello", "hi", "hey", "morning"],
        "Hey, good to see you! I'm your fitness coach. Tell me what you're \
         working on right now and we'll build from there.",
    ),
    (
        &["workout", "exercise", "training", "train", "gym"],
        "Solid training starts simple: three full-body sessions a week, \
         compound lifts first (squat, hinge, push, pull), two or three sets \
         of 8-12 reps each, and add a little weight whenever all sets feel \
         controlled. What equipment do you have access to?",
    ),
    (
        &["nutrition", "diet", "food", "eat", "protein", "meal"],
        "Food rules that cover most of the ground: protein with every meal \
         (roughly a palm-sized portion), vegetables at least twice a day, \
         water before anything sweet, and no eating straight from the \
         package. Tell me what a normal day of eating looks like and I'll \
         point at the one change worth making first.",
    ),
    (
        &["motivation", "motivated", "tired", "lazy", "quit"],
        "Motivation follows action, not the other way around. Shrink today's \
         session to something you cannot say no to, ten minutes counts, and \
         let showing up be the win. Consistency beats intensity every time.",
    ),
    (
        &["weight", "fat", "lose", "slim"],
        "Sustainable weight change is a small daily calorie deficit plus \
         enough protein to hold on to muscle, with walking as the cheapest \
         tool you have. Aim for around half a kilo a week; faster than that \
         usually comes straight back.",
    ),
    (
        &["plan", "program", "schedule", "routine"],
        "A plan you'll follow beats a perfect one you won't. Pick the days \
         you can always train, anchor each session to something you already \
         do, and write it down. Give me your available days and I'll sketch \
         a weekly split.",
    ),
];

const DEFAULT_REPLY: &str = "I'm here to help with training, nutrition, and \
                             staying on track. Ask me about your workouts, what \
                             to eat, or how to plan your week, and give me a \
                             bit of detail so the advice fits you.";

/// Canned coaching reply for one message.
#[must_use]
pub fn respond(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (keywords, reply) in RULES {
        if keywords.iter().any(|k| words.contains(k)) {
            return reply;
        }
    }
    DEFAULT_REPLY
}

#[cfg(test)]
#[path = "responder_test.rs"]
mod tests;
