use super::*;

#[test]
fn greeting_keyword_matches() {
    let reply = respond("hi coach");
    assert!(reply.contains("fitness coach"));
}

#[test]
fn matching_is_case_insensitive() {
    assert_eq!(respond("HELLO there"), respond("hello there"));
}

#[test]
fn keywords_match_whole_words_only() {
    // "think" contains "hi" but must not read as a greeting.
    let reply = respond("think about it");
    assert_eq!(reply, DEFAULT_REPLY);
}

#[test]
fn first_rule_wins_for_mixed_messages() {
    // Greeting outranks workout in the table.
    let reply = respond("hello, what workout should I do?");
    assert!(reply.contains("fitness coach"));
}

#[test]
fn each_category_has_a_distinct_reply() {
    let replies = [
        respond("hey"),
        respond("best workout?"),
        respond("what should I eat"),
        respond("no motivation today"),
        respond("I want to lose weight"),
        respond("build me a plan"),
    ];
    for (i, a) in replies.iter().enumerate() {
        for b in &replies[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn unmatched_message_gets_the_default_reply() {
    assert_eq!(respond("what is the capital of France?"), DEFAULT_REPLY);
}

#[test]
fn empty_message_gets_the_default_reply() {
    assert_eq!(respond(""), DEFAULT_REPLY);
}

#[test]
fn punctuation_does_not_block_a_match() {
    let reply = respond("Gym?!");
    assert!(reply.contains("three full-body sessions"));
}
