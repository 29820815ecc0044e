// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use reassembly::{Address, DatagramTables, FragmentKey, Pass, Payload};

/// Bytes per decoded call: convention, id, position, offset, len, more.
const OP_LEN: usize = 6;

fuzz_target!(|data: &[u8]| {
    let mut tables = DatagramTables::default();
    let ops: Vec<&[u8]> = data.chunks_exact(OP_LEN).collect();

    let mut first = Vec::with_capacity(ops.len());
    for (frame, op) in ops.iter().enumerate() {
        first.push(call(&mut tables, frame as u32 + 1, op, data, Pass::First));
    }

    // Replays are lookups: same answers, same table sizes.
    let sizes = (tables.open_len(), tables.completed_len());
    let replay: Vec<_> = ops
        .iter()
        .enumerate()
        .map(|(frame, op)| call(&mut tables, frame as u32 + 1, op, data, Pass::Replay))
        .collect();
    assert_eq!(sizes, (tables.open_len(), tables.completed_len()));
    for (frame, op) in ops.iter().enumerate() {
        let again = call(&mut tables, frame as u32 + 1, op, data, Pass::Replay);
        assert_eq!(again, replay[frame]);
    }

    for handle in first.into_iter().chain(replay).flatten() {
        let chain = tables.try_chain(handle).expect("handle issued by these tables");
        if chain.is_complete() {
            assert_eq!(chain.data().len(), chain.len());
        }
    }
    let _ = tables.dump().to_string();
});

fn call(
    tables: &mut DatagramTables,
    frame: u32,
    op: &[u8],
    capture: &[u8],
    pass: Pass,
) -> Option<reassembly::ChainHandle> {
    let key = FragmentKey::new(Address::None, Address::None, u32::from(op[1] & 0x03));
    let position = u32::from(op[2] & 0x07);
    let payload = Payload::new(capture, usize::from(op[3]), u32::from(op[4]));
    let more = op[5] & 1 == 1;
    match op[0] % 4 {
        0 => tables.add_fragment(&key, frame, position, payload, more, pass),
        1 => tables.add_fragment_check(&key, frame, position, payload, more, pass),
        2 => tables.add_fragment_802_11(&key, frame, position, payload, more, pass),
        _ => tables.add_fragment_next(&key, frame, payload, more, pass),
    }
}
