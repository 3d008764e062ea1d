use super::*;

use std::time::Duration;

use crate::record::{Address, Cname, Mx, ResourceValue, Srv, Txt};

const ZONE: &str = "example.com";

fn a(name: &str, ip: &str, ttl: u64) -> Record {
    Record::Address(Address {
        name: name.to_string(),
        ip: ip.parse().unwrap(),
        ttl: Duration::from_secs(ttl),
    })
}

fn resource(id: &str, rtype: &str, name: &str, value: &str) -> Resource {
    Resource {
        id: Some(id.to_string()),
        rtype: rtype.to_string(),
        name: name.to_string(),
        ttl: 300,
        value: ResourceValue::Content(value.to_string()),
    }
}

#[test]
fn test_relative_name() {
    assert_eq!(relative_name("www", ZONE), "www");
    assert_eq!(relative_name("WWW", ZONE), "www");
    assert_eq!(relative_name("www.example.com.", ZONE), "www");
    assert_eq!(relative_name("example.com.", "example.com."), "@");
    assert_eq!(relative_name("", ZONE), "@");
    assert_eq!(relative_name("@", ZONE), "@");
    assert_eq!(relative_name("www.notexample.com.", ZONE), "www.notexample.com.");
}

#[test]
fn test_identity_ignores_value_and_ttl() {
    let old = a("www", "192.0.2.1", 3600);
    let new = a("WWW.example.com.", "192.0.2.100", 7200);
    assert_eq!(
        IdentityKey::of_record(&old, ZONE),
        IdentityKey::of_record(&new, ZONE)
    );
    assert!(!same_record(&old, &new, ZONE));
}

#[test]
fn test_identity_separates_a_and_aaaa() {
    let v4 = a("www", "192.0.2.1", 60);
    let v6 = a("www", "2001:db8::1", 60);
    assert_ne!(
        IdentityKey::of_record(&v4, ZONE),
        IdentityKey::of_record(&v6, ZONE)
    );
}

#[test]
fn test_identity_of_resource_matches_record() {
    let r = resource("1", "aaaa", "www.example.com.", "2001:db8::1");
    assert_eq!(
        IdentityKey::of_resource(&r, ZONE),
        IdentityKey::of_record(&a("www", "2001:db8::9", 1), ZONE)
    );
}

#[test]
fn test_same_record_ignores_ttl_only() {
    assert!(same_record(
        &a("delete-me", "192.0.2.1", 3600),
        &a("delete-me", "192.0.2.1", 60),
        ZONE
    ));
    assert!(!same_record(
        &a("delete-me", "192.0.2.1", 3600),
        &a("keep-me", "192.0.2.1", 3600),
        ZONE
    ));
}

#[test]
fn test_same_record_targets_dot_and_case_insensitive() {
    let x = Record::Cname(Cname {
        name: "alias".to_string(),
        target: "WWW.example.com.".to_string(),
        ttl: Duration::ZERO,
    });
    let y = Record::Cname(Cname {
        name: "alias".to_string(),
        target: "www.example.com".to_string(),
        ttl: Duration::from_secs(30),
    });
    assert!(same_record(&x, &y, ZONE));
}

#[test]
fn test_same_record_compares_every_value_field() {
    let mx = |preference| {
        Record::Mx(Mx {
            name: "@".to_string(),
            preference,
            target: "mail.example.com".to_string(),
            ttl: Duration::ZERO,
        })
    };
    assert!(same_record(&mx(10), &mx(10), ZONE));
    assert!(!same_record(&mx(10), &mx(20), ZONE));

    let srv = |port| {
        Record::Srv(Srv {
            name: "@".to_string(),
            service: "_sip".to_string(),
            transport: "_tcp".to_string(),
            priority: 1,
            weight: 1,
            port,
            target: "sip.example.com".to_string(),
            ttl: Duration::ZERO,
        })
    };
    assert!(same_record(&srv(5060), &srv(5060), ZONE));
    assert!(!same_record(&srv(5060), &srv(5061), ZONE));

    let txt = |text: &str| {
        Record::Txt(Txt {
            name: "@".to_string(),
            text: text.to_string(),
            ttl: Duration::ZERO,
        })
    };
    assert!(!same_record(&txt("Hello"), &txt("hello"), ZONE));
    assert!(!same_record(&txt("x"), &mx(10), ZONE));
}

#[test]
fn test_tie_break_pick() {
    let candidates = [1, 2, 3];
    assert_eq!(TieBreak::First.pick(&candidates), Some(1));
    assert_eq!(TieBreak::Last.pick(&candidates), Some(3));
    assert_eq!(TieBreak::default().pick::<i32>(&[]), None);
}

#[test]
fn test_snapshot_lookup() {
    let snapshot = Snapshot::new(
        ZONE,
        vec![
            resource("1", "A", "www", "192.0.2.1"),
            resource("2", "A", "www", "192.0.2.2"),
            resource("3", "AAAA", "www", "2001:db8::1"),
            resource("4", "A", "broken", "not-an-ip"),
            resource("5", "FORWARD_DOMAIN", "corp", ""),
            Resource {
                id: None,
                ..resource("x", "A", "pending", "192.0.2.9")
            },
        ],
    );

    assert_eq!(snapshot.len(), 5);

    let key = IdentityKey::of_record(&a("www", "192.0.2.50", 1), ZONE);
    let ids: Vec<&str> = snapshot
        .by_identity(&key)
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);

    let exact = snapshot.by_equality(&a("www", "192.0.2.2", 1), ZONE);
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, "2");

    // unmappable resources still have an identity but never compare equal
    let broken = IdentityKey::of_record(&a("broken", "192.0.2.1", 1), ZONE);
    assert_eq!(snapshot.by_identity(&broken).len(), 1);
    assert!(snapshot.by_equality(&a("broken", "192.0.2.1", 1), ZONE).is_empty());
}
