// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::doc_markdown)] // Test documentation
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::similar_names)] // Test variable naming
#![allow(clippy::unreadable_literal)] // Large test constants

//! Behavioral suite for every call convention.
//!
//! All scenarios share one 256-byte capture where `data[i] == i`; payloads are
//! `(offset, length)` windows into it. Frames 1..n are replayed afterwards
//! where the scenario says so.

use reassembly::{
    ActivityId, ActivityKey, Address, DatagramTables, FragmentChain, FragmentFlags, FragmentKey,
    NodeData, Pass, Payload, RpcDatagramTables, TableConfig,
};

const DATA_LEN: usize = 256;

fn capture() -> Vec<u8> {
    (0..DATA_LEN).map(|i| (i & 0xff) as u8).collect()
}

fn key(id: u32) -> FragmentKey {
    FragmentKey::new(
        Address::Ipv4([1, 2, 3, 4].into()),
        Address::Ipv4([5, 6, 7, 8].into()),
        id,
    )
}

fn tables() -> DatagramTables {
    DatagramTables::new(TableConfig::default().name("suite"))
}

/// `(frame, position, len, flags)` in position order.
fn layout(chain: &FragmentChain) -> Vec<(u32, u32, u32, FragmentFlags)> {
    chain
        .nodes_by_position()
        .map(|n| (n.frame, n.position, n.len, n.flags))
        .collect()
}

const NONE: FragmentFlags = FragmentFlags::empty();
const OL: FragmentFlags = FragmentFlags::OVERLAPS_PRIOR;
const DF: FragmentFlags = FragmentFlags::DEFRAGMENTED;

// ---------------------------------------------------------------------------
// Explicit sequence
// ---------------------------------------------------------------------------

#[test]
fn test_simple_explicit_sequence() {
    let data = capture();
    let mut t = tables();

    let r = t.add_fragment(&key(12), 1, 0, Payload::new(&data, 10, 50), true, Pass::First);
    assert_eq!(t.open_len(), 1);
    assert!(r.is_none());

    // Revisiting an incomplete message changes nothing, whatever the arguments.
    let r = t.add_fragment(&key(12), 1, 0, Payload::new(&data, 5, 60), true, Pass::Replay);
    assert_eq!(t.open_len(), 1);
    assert!(r.is_none());

    // Another message, just to confuse things.
    let r = t.add_fragment(&key(13), 2, 0, Payload::new(&data, 15, 60), true, Pass::First);
    assert_eq!(t.open_len(), 2);
    assert!(r.is_none());

    let r = t.add_fragment(&key(12), 3, 2, Payload::new(&data, 5, 60), false, Pass::First);
    assert_eq!(t.open_len(), 2);
    assert!(r.is_none());

    let head = t
        .add_fragment(&key(12), 4, 1, Payload::new(&data, 15, 60), true, Pass::First)
        .expect("complete after frame 4");
    assert_eq!(t.open_len(), 2);

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 170);
    assert_eq!(chain.final_position(), Some(2));
    assert_eq!(chain.completed_at(), Some(4));
    assert_eq!(chain.flags(), DF);
    assert_eq!(
        layout(chain),
        vec![(1, 0, 50, NONE), (4, 1, 60, NONE), (3, 2, 60, NONE)]
    );
    assert!(chain
        .nodes()
        .all(|n| matches!(n.data, NodeData::Aliased { .. })));
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..110], &data[15..75]);
    assert_eq!(&chain.data()[110..170], &data[5..65]);

    // Revisits of every contributing frame find the finished message.
    for (frame, position, offset, len, more) in
        [(1, 0, 10, 50, true), (3, 2, 5, 60, false), (4, 1, 15, 60, true)]
    {
        let r = t.add_fragment(
            &key(12),
            frame,
            position,
            Payload::new(&data, offset, len),
            more,
            Pass::Replay,
        );
        assert_eq!(r, Some(head));
    }
    assert_eq!(t.chain(head).unwrap().fragment_count(), 3);
}

#[test]
fn test_partial_reassembly() {
    let data = capture();
    let mut t = tables();
    let k = key(12);

    let head = t
        .add_fragment(&k, 1, 0, Payload::new(&data, 10, 50), false, Pass::First)
        .expect("single fragment completes");
    {
        let chain = t.chain(head).unwrap();
        assert_eq!(t.open_len(), 1);
        assert_eq!(chain.len(), 50);
        assert_eq!(chain.final_position(), Some(0));
        assert_eq!(chain.completed_at(), Some(1));
        assert_eq!(chain.flags(), DF);
        assert_eq!(chain.data(), &data[10..60]);
    }

    assert!(t.reopen(&k));

    let r = t.add_fragment(&k, 2, 1, Payload::new(&data, 0, 40), true, Pass::First);
    assert!(r.is_none());
    assert_eq!(t.open_len(), 1);
    {
        let chain = t.chain(t.lookup(&k).unwrap()).unwrap();
        assert_eq!(chain.final_position(), None);
        assert_eq!(chain.completed_at(), None);
        assert!(!chain.is_complete());
        assert!(!chain.is_awaiting_reopen());
        // The old head range survives as an alias into the previous buffer.
        let first = chain.nodes().next().unwrap();
        assert!(matches!(first.data, NodeData::Aliased { start: 0, len: 50 }));
        assert_eq!(chain.node_bytes(first).unwrap(), &data[10..60]);
        assert_eq!(layout(chain), vec![(1, 0, 50, NONE), (2, 1, 40, NONE)]);
    }

    let r = t.add_fragment(&k, 3, 1, Payload::new(&data, 0, 40), true, Pass::First);
    assert!(r.is_none());
    assert_eq!(
        layout(t.chain(head).unwrap()),
        vec![(1, 0, 50, NONE), (2, 1, 40, NONE), (3, 1, 40, OL)]
    );

    let done = t
        .add_fragment(&k, 4, 2, Payload::new(&data, 20, 100), false, Pass::First)
        .expect("complete again");
    assert_eq!(done, head);
    {
        let chain = t.chain(done).unwrap();
        assert_eq!(t.open_len(), 1);
        assert_eq!(chain.len(), 190);
        assert_eq!(chain.final_position(), Some(2));
        assert_eq!(chain.completed_at(), Some(4));
        assert_eq!(chain.flags(), DF | OL);
        assert_eq!(
            layout(chain),
            vec![
                (1, 0, 50, NONE),
                (2, 1, 40, NONE),
                (3, 1, 40, OL),
                (4, 2, 100, NONE)
            ]
        );
        assert_eq!(&chain.data()[0..50], &data[10..60]);
        assert_eq!(&chain.data()[50..90], &data[0..40]);
        assert_eq!(&chain.data()[90..190], &data[20..120]);
    }

    assert!(t.reopen(&k));
    t.add_fragment(&k, 5, 3, Payload::new(&data, 0, 40), false, Pass::First);

    let chain = t.chain(t.lookup(&k).unwrap()).unwrap();
    assert_eq!(chain.len(), 230);
    assert_eq!(chain.final_position(), Some(3));
    assert_eq!(chain.completed_at(), Some(5));
    assert_eq!(chain.flags(), DF | OL);
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..90], &data[0..40]);
    assert_eq!(&chain.data()[90..190], &data[20..120]);
    assert_eq!(&chain.data()[190..230], &data[0..40]);
}

#[test]
fn test_duplicate_first() {
    let data = capture();
    let mut t = tables();
    let k = key(12);

    assert!(t
        .add_fragment(&k, 1, 0, Payload::new(&data, 10, 50), true, Pass::First)
        .is_none());
    assert!(t
        .add_fragment(&k, 2, 1, Payload::new(&data, 5, 60), true, Pass::First)
        .is_none());
    let head = t
        .add_fragment(&k, 3, 2, Payload::new(&data, 5, 40), false, Pass::First)
        .expect("complete at frame 3");
    let late = t.add_fragment(&k, 4, 0, Payload::new(&data, 10, 50), true, Pass::First);
    assert_eq!(late, Some(head));
    assert_eq!(t.open_len(), 1);

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 150);
    assert_eq!(chain.final_position(), Some(2));
    assert_eq!(chain.completed_at(), Some(3));
    assert_eq!(chain.flags(), DF | OL);
    assert_eq!(
        layout(chain),
        vec![
            (1, 0, 50, NONE),
            (4, 0, 50, OL),
            (2, 1, 60, NONE),
            (3, 2, 40, NONE)
        ]
    );
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..110], &data[5..65]);
    assert_eq!(&chain.data()[110..150], &data[5..45]);
}

#[test]
fn test_duplicate_middle() {
    let data = capture();
    let mut t = tables();
    let k = key(12);

    t.add_fragment(&k, 1, 0, Payload::new(&data, 10, 50), true, Pass::First);
    t.add_fragment(&k, 2, 1, Payload::new(&data, 5, 60), true, Pass::First);
    assert!(t
        .add_fragment(&k, 3, 1, Payload::new(&data, 5, 60), true, Pass::First)
        .is_none());
    let head = t
        .add_fragment(&k, 4, 2, Payload::new(&data, 5, 40), false, Pass::First)
        .expect("complete at frame 4");

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 150);
    assert_eq!(chain.completed_at(), Some(4));
    assert_eq!(chain.flags(), DF | OL);
    assert_eq!(
        layout(chain),
        vec![
            (1, 0, 50, NONE),
            (2, 1, 60, NONE),
            (3, 1, 60, OL),
            (4, 2, 40, NONE)
        ]
    );
    assert_eq!(&chain.data()[50..110], &data[5..65]);
}

#[test]
fn test_duplicate_last() {
    let data = capture();
    let mut t = tables();
    let k = key(12);

    t.add_fragment(&k, 1, 0, Payload::new(&data, 10, 50), true, Pass::First);
    t.add_fragment(&k, 2, 1, Payload::new(&data, 5, 60), true, Pass::First);
    let head = t
        .add_fragment(&k, 3, 2, Payload::new(&data, 5, 40), false, Pass::First)
        .expect("complete at frame 3");
    let late = t.add_fragment(&k, 4, 2, Payload::new(&data, 5, 40), false, Pass::First);
    assert_eq!(late, Some(head));

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 150);
    assert_eq!(chain.completed_at(), Some(3));
    assert_eq!(chain.flags(), DF | OL);
    assert_eq!(
        layout(chain),
        vec![
            (1, 0, 50, NONE),
            (2, 1, 60, NONE),
            (3, 2, 40, NONE),
            (4, 2, 40, OL)
        ]
    );
    assert_eq!(&chain.data()[110..150], &data[5..45]);
}

#[test]
fn test_duplicate_conflict() {
    let data = capture();
    let mut t = tables();
    let k = key(12);

    t.add_fragment(&k, 1, 0, Payload::new(&data, 10, 50), true, Pass::First);
    t.add_fragment(&k, 2, 1, Payload::new(&data, 5, 60), true, Pass::First);
    // Same position, different bytes.
    t.add_fragment(&k, 3, 1, Payload::new(&data, 15, 60), true, Pass::First);
    let head = t
        .add_fragment(&k, 4, 2, Payload::new(&data, 5, 40), false, Pass::First)
        .expect("complete at frame 4");

    let oc = FragmentFlags::CONTENT_CONFLICTS_WITH_PRIOR;
    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 150);
    assert_eq!(chain.completed_at(), Some(4));
    assert_eq!(chain.flags(), DF | OL | oc);
    assert_eq!(
        layout(chain),
        vec![
            (1, 0, 50, NONE),
            (2, 1, 60, NONE),
            (3, 1, 60, OL | oc),
            (4, 2, 40, NONE)
        ]
    );
    // First-seen bytes win.
    assert_eq!(&chain.data()[50..110], &data[5..65]);
    let conflicting = chain.nodes().find(|n| n.frame == 3).unwrap();
    assert_eq!(chain.node_bytes(conflicting).unwrap(), &data[15..75]);
}

// ---------------------------------------------------------------------------
// RPC datagram
// ---------------------------------------------------------------------------

#[test]
fn test_rpc_datagram() {
    let data = capture();
    let mut t = RpcDatagramTables::new(TableConfig::default().name("dcerpc-dg"));
    let src = Address::Ipv4([1, 2, 3, 4].into());
    let dst = Address::Ipv4([5, 6, 7, 8].into());
    let act = ActivityId::from_fields(1, 2, 3, [4, 5, 6, 7, 8, 9, 10, 11]);
    let other = ActivityId::from_fields(11, 12, 13, [14, 15, 16, 17, 18, 19, 20, 21]);
    let k12 = ActivityKey::new(src.clone(), dst.clone(), 12, act);

    assert!(t
        .add_datagram_fragment(&k12, 1, 0, Payload::new(&data, 10, 50), true, Pass::First)
        .is_none());
    assert_eq!(t.open_len(), 1);

    let k13 = ActivityKey::new(src.clone(), dst.clone(), 13, act);
    t.add_datagram_fragment(&k13, 2, 0, Payload::new(&data, 15, 60), true, Pass::First);
    assert_eq!(t.open_len(), 2);

    // Same id, different activity: a separate message.
    let k12_other = ActivityKey::new(src, dst, 12, other);
    t.add_datagram_fragment(&k12_other, 3, 0, Payload::new(&data, 15, 60), true, Pass::First);
    assert_eq!(t.open_len(), 3);

    let head = t
        .add_datagram_fragment(&k12, 4, 1, Payload::new(&data, 5, 60), false, Pass::First)
        .expect("complete at frame 4");
    assert_eq!(t.open_len(), 3);

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 110);
    assert_eq!(chain.final_position(), Some(1));
    assert_eq!(chain.completed_at(), Some(4));
    assert_eq!(chain.flags(), DF);
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..110], &data[5..65]);

    let r = t.add_datagram_fragment(&k12, 1, 0, Payload::new(&data, 10, 50), true, Pass::Replay);
    assert_eq!(r, Some(head));
}

// ---------------------------------------------------------------------------
// Check family
// ---------------------------------------------------------------------------

type Convention = fn(
    &mut DatagramTables,
    &FragmentKey,
    u32,
    u32,
    Payload<'_>,
    bool,
    Pass,
) -> Option<reassembly::ChainHandle>;

fn check_work(add: Convention) {
    let data = capture();
    let mut t = tables();

    assert!(add(&mut t, &key(12), 1, 0, Payload::new(&data, 10, 50), true, Pass::First).is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    assert!(add(&mut t, &key(13), 2, 0, Payload::new(&data, 15, 60), true, Pass::First).is_none());
    assert_eq!((t.open_len(), t.completed_len()), (2, 0));

    assert!(add(&mut t, &key(12), 3, 2, Payload::new(&data, 5, 60), false, Pass::First).is_none());
    assert_eq!((t.open_len(), t.completed_len()), (2, 0));

    let head = add(&mut t, &key(12), 4, 1, Payload::new(&data, 15, 60), true, Pass::First)
        .expect("complete at frame 4");
    assert_eq!((t.open_len(), t.completed_len()), (1, 3));

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 170);
    assert_eq!(chain.final_position(), Some(2));
    assert_eq!(chain.completed_at(), Some(4));
    assert_eq!(chain.flags(), DF);
    assert_eq!(
        layout(chain),
        vec![(1, 0, 50, NONE), (4, 1, 60, NONE), (3, 2, 60, NONE)]
    );
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..110], &data[15..75]);
    assert_eq!(&chain.data()[110..170], &data[5..65]);

    for frame in [1, 3, 4] {
        assert_eq!(t.lookup_completed(12, frame), Some(head));
    }
    assert!(t.lookup_completed(13, 2).is_none());
}

#[test]
fn test_check() {
    check_work(DatagramTables::add_fragment_check);
}

#[test]
fn test_check_terminal_first() {
    let data = capture();
    let mut t = tables();

    assert!(t
        .add_fragment_check(&key(12), 1, 1, Payload::new(&data, 10, 50), false, Pass::First)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    let head = t
        .add_fragment_check(&key(12), 2, 0, Payload::new(&data, 5, 60), true, Pass::First)
        .expect("complete at frame 2");
    assert_eq!((t.open_len(), t.completed_len()), (0, 2));

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 110);
    assert_eq!(chain.final_position(), Some(1));
    assert_eq!(chain.completed_at(), Some(2));
    assert_eq!(chain.flags(), DF);
    assert_eq!(layout(chain), vec![(2, 0, 60, NONE), (1, 1, 50, NONE)]);
    assert_eq!(&chain.data()[0..60], &data[5..65]);
    assert_eq!(&chain.data()[60..110], &data[10..60]);
}

#[test]
fn test_link_layer_unfragmented_nonzero_position() {
    let data = capture();
    let mut t = tables();

    let head = t
        .add_fragment_802_11(&key(12), 1, 10, Payload::new(&data, 10, 50), false, Pass::First)
        .expect("complete immediately");
    assert_eq!((t.open_len(), t.completed_len()), (0, 1));

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 0);
    assert!(chain.is_empty());
    assert_eq!(chain.completed_at(), Some(1));
    assert_eq!(chain.flags(), DF);
    assert_eq!(chain.fragment_count(), 0);
}

#[test]
fn test_link_layer_behaves_like_check() {
    check_work(DatagramTables::add_fragment_802_11);
}

// ---------------------------------------------------------------------------
// Implicit ordinal
// ---------------------------------------------------------------------------

#[test]
fn test_simple_ordinal() {
    let data = capture();
    let mut t = tables();

    assert!(t
        .add_fragment_next(&key(12), 1, Payload::new(&data, 10, 50), true, Pass::First)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    // Replay of an incomplete message: nothing to find, nothing changes.
    assert!(t
        .add_fragment_next(&key(12), 1, Payload::new(&data, 5, 60), true, Pass::Replay)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    assert!(t
        .add_fragment_next(&key(13), 2, Payload::new(&data, 15, 60), true, Pass::First)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (2, 0));

    let head = t
        .add_fragment_next(&key(12), 3, Payload::new(&data, 5, 60), false, Pass::First)
        .expect("complete at frame 3");
    assert_eq!((t.open_len(), t.completed_len()), (1, 2));

    let chain = t.chain(head).unwrap();
    assert_eq!(chain.len(), 110);
    assert_eq!(chain.final_position(), Some(1));
    assert_eq!(chain.completed_at(), Some(3));
    assert_eq!(chain.flags(), DF);
    assert_eq!(layout(chain), vec![(1, 0, 50, NONE), (3, 1, 60, NONE)]);
    assert_eq!(&chain.data()[0..50], &data[10..60]);
    assert_eq!(&chain.data()[50..110], &data[5..65]);
}

#[test]
fn test_ordinal_missing_data_first_fragment() {
    let data = capture();
    let mut t = tables();
    let tl = FragmentFlags::DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA;

    // One byte more than the capture holds from offset 10.
    let head = t
        .add_fragment_next(
            &key(12),
            1,
            Payload::new(&data, 10, DATA_LEN as u32 - 9),
            true,
            Pass::First,
        )
        .expect("failed head is handed back");
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));
    {
        let chain = t.chain(head).unwrap();
        assert!(!chain.is_complete());
        assert_eq!(chain.len(), 0);
        assert_eq!(chain.final_position(), None);
        assert_eq!(chain.completed_at(), None);
        assert!(chain.flags().contains(tl));
    }

    assert!(t
        .add_fragment_next(&key(12), 4, Payload::new(&data, 5, 60), false, Pass::First)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    for (frame, offset, len, more) in [(1, 10, DATA_LEN as u32 - 9, true), (4, 5, 60, false)] {
        let payload = Payload::new(&data, offset, len);
        let r = t.add_fragment_next(&key(12), frame, payload, more, Pass::Replay);
        assert!(r.is_none());
        assert_eq!((t.open_len(), t.completed_len()), (1, 0));
    }
}

#[test]
fn test_ordinal_missing_data_second_fragment() {
    let data = capture();
    let mut t = tables();

    assert!(t
        .add_fragment_next(&key(24), 11, Payload::new(&data, 10, 50), true, Pass::First)
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (1, 0));

    assert!(t
        .add_fragment_next(
            &key(24),
            12,
            Payload::new(&data, 5, DATA_LEN as u32 - 4),
            false,
            Pass::First,
        )
        .is_none());
    assert_eq!((t.open_len(), t.completed_len()), (0, 0));

    for (frame, offset, len, more) in [(11, 10, 50, true), (12, 5, DATA_LEN as u32 - 4, false)] {
        let payload = Payload::new(&data, offset, len);
        let r = t.add_fragment_next(&key(24), frame, payload, more, Pass::Replay);
        assert!(r.is_none());
        assert_eq!((t.open_len(), t.completed_len()), (0, 0));
    }
}

#[test]
fn test_ordinal_missing_data_single_fragment() {
    let data = capture();
    let mut t = tables();

    let head = t
        .add_fragment_next(
            &key(30),
            20,
            Payload::new(&data, 5, DATA_LEN as u32 - 4),
            false,
            Pass::First,
        )
        .expect("unfragmented message");
    assert_eq!((t.open_len(), t.completed_len()), (0, 1));
    {
        let chain = t.chain(head).unwrap();
        assert_eq!(chain.len(), 0);
        assert_eq!(chain.completed_at(), Some(20));
        assert_eq!(chain.flags(), DF);
        assert_eq!(chain.fragment_count(), 0);
    }

    let replay = t.add_fragment_next(
        &key(30),
        20,
        Payload::new(&data, 5, DATA_LEN as u32 - 4),
        false,
        Pass::Replay,
    );
    assert_eq!(replay, Some(head));
    assert_eq!((t.open_len(), t.completed_len()), (0, 1));
}
