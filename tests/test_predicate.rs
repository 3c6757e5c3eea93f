use narrow_filter::context::{NarrowContext, RealmSettings};
use narrow_filter::filter::{Filter, Term};
use narrow_filter::message::{DisplayRecipient, Message, MessageKind, Recipient};
use narrow_filter::people::{People, Person, UserId};
use narrow_filter::streams::{Streams, Subscription};

const IAGO: UserId = 5;
const HAMLET: UserId = 6;
const CORDELIA: UserId = 7;

fn person(user_id: UserId, email: &str) -> Person {
    Person {
        user_id,
        email: email.to_string(),
        full_name: String::new(),
    }
}

fn ctx() -> NarrowContext {
    let people = People::new()
        .with_me(person(IAGO, "iago@zulip.com"))
        .with_person(person(HAMLET, "hamlet@zulip.com"))
        .with_person(person(CORDELIA, "cordelia@zulip.com"));
    let streams = Streams::new()
        .with_sub(Subscription::new(1, "Denmark"))
        .with_sub(Subscription::new(2, "Verona"))
        .with_sub(Subscription::new(3, "noise").muted());
    NarrowContext::default()
        .with_people(people)
        .with_streams(streams)
}

fn zephyr_ctx() -> NarrowContext {
    NarrowContext::default().with_realm(RealmSettings {
        is_zephyr_mirror_realm: true,
        narrow_stream: None,
    })
}

fn filter(terms: &[Term]) -> Filter {
    Filter::new(terms.to_vec(), ctx())
}

fn stream_message(stream: &str, stream_id: Option<u64>, topic: &str) -> Message {
    Message {
        id: 1,
        kind: Some(MessageKind::Stream),
        stream: stream.to_string(),
        stream_id,
        topic: topic.to_string(),
        display_recipient: DisplayRecipient::Stream(stream.to_string()),
        ..Message::default()
    }
}

fn private_message(sender: UserId, recipients: &[UserId]) -> Message {
    Message {
        id: 2,
        kind: Some(MessageKind::Private),
        sender_id: Some(sender),
        display_recipient: DisplayRecipient::Users(
            recipients
                .iter()
                .map(|id| Recipient {
                    id: *id,
                    ..Recipient::default()
                })
                .collect(),
        ),
        ..Message::default()
    }
}

#[test]
fn test_identity_filter_matches_any_message() {
    let empty: Message = serde_json::from_str("{}").expect("empty object is a message");
    assert!(Filter::default().matches(&empty));
    assert!(filter(&[]).matches(&empty));
    assert!(filter(&[]).matches(&private_message(HAMLET, &[IAGO, HAMLET])));
}

#[test]
fn test_stream_and_topic() {
    let f = filter(&[Term::new("stream", "Foo"), Term::new("topic", "Bar")]);
    assert!(f.matches(&stream_message("foo", None, "bar")));
    assert!(f.matches(&stream_message("FOO", Some(99), "BAR")));
    assert!(!f.matches(&stream_message("foo", None, "whatever")));
    assert!(!f.matches(&private_message(HAMLET, &[IAGO, HAMLET])));
}

#[test]
fn test_known_stream_matches_by_id() {
    let f = filter(&[Term::new("stream", "denmark")]);
    assert_eq!(f.operands("stream"), vec!["Denmark"]);
    assert!(f.matches(&stream_message("Old Denmark Name", Some(1), "x")));
    assert!(!f.matches(&stream_message("Denmark", Some(2), "x")));
}

#[test]
fn test_topic_requires_stream_message() {
    let f = filter(&[Term::new("subject", "lunch")]);
    assert!(f.matches(&stream_message("Verona", Some(2), "Lunch")));
    let mut private = private_message(HAMLET, &[IAGO, HAMLET]);
    private.topic = "lunch".to_string();
    assert!(!f.matches(&private));
}

#[test]
fn test_is_operands() {
    let mut starred = stream_message("Denmark", Some(1), "x");
    starred.starred = true;
    starred.unread = true;
    let mut mentioned = stream_message("Denmark", Some(1), "x");
    mentioned.mentioned = true;
    mentioned.alerted = true;
    let private = private_message(HAMLET, &[IAGO, HAMLET]);

    assert!(filter(&[Term::new("is", "private")]).matches(&private));
    assert!(!filter(&[Term::new("is", "private")]).matches(&starred));
    assert!(filter(&[Term::new("is", "starred")]).matches(&starred));
    assert!(!filter(&[Term::new("is", "starred")]).matches(&mentioned));
    assert!(filter(&[Term::new("is", "unread")]).matches(&starred));
    assert!(filter(&[Term::new("is", "mentioned")]).matches(&mentioned));
    assert!(filter(&[Term::new("is", "alerted")]).matches(&mentioned));
    assert!(!filter(&[Term::new("is", "alerted")]).matches(&private));
}

#[test]
fn test_unrecognized_operands_match_everything() {
    let message = stream_message("Denmark", Some(1), "x");
    assert!(filter(&[Term::new("is", "bogus")]).matches(&message));
    assert!(filter(&[Term::new("in", "bogus")]).matches(&message));
    assert!(filter(&[Term::new("bogus", "whatever")]).matches(&message));
    assert!(filter(&[Term::new("", "")]).matches(&message));
}

#[test]
fn test_in_home_and_all() {
    let in_home = filter(&[Term::new("in", "home")]);
    let in_all = filter(&[Term::new("in", "all")]);
    let muted = stream_message("noise", Some(3), "x");

    assert!(in_home.matches(&stream_message("Denmark", Some(1), "x")));
    assert!(in_home.matches(&private_message(HAMLET, &[IAGO, HAMLET])));
    assert!(!in_home.matches(&muted));
    assert!(in_all.matches(&muted));

    let mut mentioned = muted.clone();
    mentioned.mentioned = true;
    assert!(in_home.matches(&mentioned));
}

#[test]
fn test_in_home_includes_embedded_narrow_stream() {
    let ctx = ctx().with_realm(RealmSettings {
        is_zephyr_mirror_realm: false,
        narrow_stream: Some("Noise".to_string()),
    });
    let f = Filter::new(vec![Term::new("in", "home")], ctx);
    assert!(f.matches(&stream_message("noise", Some(3), "x")));
}

#[test]
fn test_near_and_id() {
    let mut message = stream_message("Denmark", Some(1), "x");
    message.id = 42;
    assert!(filter(&[Term::new("near", "5")]).matches(&message));
    assert!(filter(&[Term::new("id", "42")]).matches(&message));
    assert!(!filter(&[Term::new("id", "41")]).matches(&message));
}

#[test]
fn test_sender() {
    let message = private_message(HAMLET, &[IAGO, HAMLET]);
    assert!(filter(&[Term::new("sender", "Hamlet@zulip.com")]).matches(&message));
    assert!(filter(&[Term::new("from", "hamlet@zulip.com")]).matches(&message));
    assert!(!filter(&[Term::new("sender", "cordelia@zulip.com")]).matches(&message));
    assert!(!filter(&[Term::new("sender", "nobody@zulip.com")]).matches(&message));
    assert!(filter(&[Term::negated("sender", "nobody@zulip.com")]).matches(&message));
}

#[test]
fn test_sender_me() {
    let message = private_message(IAGO, &[IAGO, HAMLET]);
    assert!(filter(&[Term::new("sender", "me")]).matches(&message));
}

#[test]
fn test_pm_with() {
    let one_on_one = private_message(HAMLET, &[IAGO, HAMLET]);
    let group = private_message(HAMLET, &[IAGO, HAMLET, CORDELIA]);
    let to_self = private_message(IAGO, &[IAGO]);

    let with_hamlet = filter(&[Term::new("pm-with", "hamlet@zulip.com")]);
    assert!(with_hamlet.matches(&one_on_one));
    assert!(!with_hamlet.matches(&group));
    assert!(!with_hamlet.matches(&stream_message("Denmark", Some(1), "x")));

    let with_both = filter(&[Term::new("pm-with", "cordelia@zulip.com, Hamlet@zulip.com")]);
    assert!(with_both.matches(&group));
    assert!(!with_both.matches(&one_on_one));

    let with_both_and_me = filter(&[Term::new(
        "pm-with",
        "hamlet@zulip.com,iago@zulip.com,cordelia@zulip.com",
    )]);
    assert!(with_both_and_me.matches(&group));

    assert!(filter(&[Term::new("pm-with", "me")]).matches(&to_self));
    assert!(!filter(&[Term::new("pm-with", "me")]).matches(&one_on_one));
}

#[test]
fn test_pm_with_unknown_address_never_matches() {
    let f = filter(&[Term::new("pm-with", "hamlet@zulip.com,nobody@zulip.com")]);
    assert!(!f.matches(&private_message(HAMLET, &[IAGO, HAMLET])));
    let f = filter(&[Term::new("pm-with", "")]);
    assert!(!f.matches(&private_message(HAMLET, &[IAGO, HAMLET])));
}

#[test]
fn test_group_pm_with() {
    let f = filter(&[Term::new("group-pm-with", "Cordelia@zulip.com")]);
    assert!(f.matches(&private_message(HAMLET, &[IAGO, HAMLET, CORDELIA])));
    assert!(f.matches(&private_message(CORDELIA, &[CORDELIA, IAGO])));
    assert!(!f.matches(&private_message(HAMLET, &[HAMLET, CORDELIA])));
    assert!(!f.matches(&private_message(HAMLET, &[IAGO, HAMLET])));
    assert!(!f.matches(&stream_message("Denmark", Some(1), "x")));
    assert!(!filter(&[Term::new("group-pm-with", "nobody@zulip.com")])
        .matches(&private_message(HAMLET, &[IAGO, HAMLET])));
}

#[test]
fn test_search_and_has_defer_to_server() {
    let message = private_message(HAMLET, &[IAGO, HAMLET]);
    for terms in [
        vec![Term::new("search", "hello")],
        vec![Term::negated("search", "hello")],
        vec![Term::new("has", "link")],
        vec![Term::negated("has", "image")],
        vec![Term::new("stream", "nowhere"), Term::new("search", "hello")],
    ] {
        let f = filter(&terms);
        assert!(!f.can_apply_locally());
        assert!(f.matches(&message), "{f} should accept everything locally");
    }
}

#[test]
fn test_negation_inverts_each_operator() {
    let mut starred = stream_message("Denmark", Some(1), "lunch");
    starred.starred = true;
    starred.id = 9;
    let messages = vec![
        starred,
        stream_message("noise", Some(3), "x"),
        stream_message("foo", None, "bar"),
        private_message(HAMLET, &[IAGO, HAMLET]),
        private_message(HAMLET, &[IAGO, HAMLET, CORDELIA]),
        private_message(IAGO, &[IAGO]),
        Message::default(),
    ];
    let terms = [
        ("stream", "Denmark"),
        ("stream", "foo"),
        ("topic", "lunch"),
        ("is", "private"),
        ("is", "starred"),
        ("is", "bogus"),
        ("in", "home"),
        ("near", "9"),
        ("id", "9"),
        ("sender", "hamlet@zulip.com"),
        ("pm-with", "hamlet@zulip.com"),
        ("group-pm-with", "cordelia@zulip.com"),
        ("bogus", "x"),
    ];

    for (operator, operand) in terms {
        let plain = filter(&[Term::new(operator, operand)]);
        let negated = filter(&[Term::negated(operator, operand)]);
        for message in &messages {
            assert_eq!(
                plain.matches(message),
                !negated.matches(message),
                "{operator}:{operand} on message {message:?}"
            );
        }
    }
}

#[test]
fn test_zephyr_mirror_exceptions() {
    let f = Filter::new(
        vec![Term::new("stream", "Foo"), Term::new("topic", "personal")],
        zephyr_ctx(),
    );
    assert!(f.matches(&stream_message("foo", None, "personal")));
    assert!(f.matches(&stream_message("foo.d", None, "personal")));
    assert!(f.matches(&stream_message("foo.d", None, "")));
    assert!(f.matches(&stream_message("unfoo", None, "(instance \"\")")));
    assert!(!f.matches(&stream_message("foo", None, "whatever")));
    assert!(!f.matches(&private_message(HAMLET, &[HAMLET])));

    let f = Filter::new(
        vec![Term::new("stream", "Foo"), Term::new("topic", "bar")],
        zephyr_ctx(),
    );
    assert!(f.matches(&stream_message("foo", None, "bar.d")));
    assert!(!f.matches(&stream_message("foo", None, "")));
}

#[test]
fn test_zephyr_empty_operands_do_not_match() {
    let f = Filter::new(
        vec![Term::new("stream", ""), Term::new("topic", "bar")],
        zephyr_ctx(),
    );
    assert!(!f.matches(&stream_message("foo", None, "bar")));

    let f = Filter::new(
        vec![Term::new("stream", "foo"), Term::new("topic", "")],
        zephyr_ctx(),
    );
    assert!(!f.matches(&stream_message("foo", None, "bar")));
}

#[test]
fn test_zephyr_operands_with_regex_characters() {
    let f = Filter::new(
        vec![Term::new("stream", "c++ (beta)"), Term::new("topic", "[x]")],
        zephyr_ctx(),
    );
    assert!(f.matches(&stream_message("c++ (beta).d", None, "[x].d")));
    assert!(!f.matches(&stream_message("c (beta)", None, "x")));
}
