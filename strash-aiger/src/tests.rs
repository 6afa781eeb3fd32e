use assert_matches::assert_matches;
use strash::{AigNode, Network};

use crate::{
    binary::{self, Config, Layout, ParseOutcome, Warning},
    InnerReadError, ReadError,
};

fn parse(bytes: &[u8]) -> Result<ParseOutcome, ReadError> {
    binary::Parser::from_read(bytes, Config::default())?.parse()
}

fn write(network: &Network, layout: Layout) -> Vec<u8> {
    let mut buf = vec![];
    let mut writer = binary::Writer::from_write(&mut buf, layout);
    writer.write_network(network);
    writer.finish().unwrap();
    buf
}

fn assert_acyclic(network: &Network) {
    for (index, node) in network.iter_nodes() {
        if let AigNode::And { fanins } = node {
            assert!(fanins[0].index() < index);
            assert!(fanins[1].index() < index);
        }
    }
    network.check().unwrap();
}

/// The gate `PO = PI1 & true` collapses while reading: the sole output
/// ends up driven by the input directly and no gate survives.
#[test]
fn collapsing_gate_end_to_end() {
    let bytes = b"aig 2 1 0 1 1\n4\n\x02\x01";
    let outcome = parse(bytes).unwrap();
    let network = &outcome.network;

    assert_eq!(network.input_count(), 1);
    assert_eq!(network.latch_count(), 0);
    assert_eq!(network.output_count(), 1);
    assert_eq!(network.and_count(), 0);
    assert_eq!(network.output_driver(0), network.input(0));
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.comment, None);
    assert_acyclic(network);
}

#[test]
fn writer_reference_bytes() {
    let mut network = Network::new();
    let a = network.add_input();
    let b = network.add_input();
    let g = network.and2(a, b);
    network.add_output(g);

    assert_eq!(write(&network, Layout::Ascii), b"aig 3 2 0 1 1\n6\n\x02\x02");
    assert_eq!(
        write(&network, Layout::DeltaCoded),
        b"aig2 3 2 0 1 1\n\x06\x02\x02"
    );
}

#[test]
fn empty_network_roundtrip() {
    let network = Network::new();
    let bytes = write(&network, Layout::Ascii);
    assert_eq!(bytes, b"aig 0 0 0 0 0\n");

    let outcome = parse(&bytes).unwrap();
    assert_eq!(outcome.network.node_count(), 1);
    assert_eq!(outcome.network.output_count(), 0);
}

fn sequential_network() -> Network {
    let mut network = Network::new();
    let a = network.add_input();
    let b = network.add_input();
    let l = network.add_latch();
    let g1 = network.and2(a, b);
    let g2 = network.and2(g1, !l);
    network.bind_latch_next(0, !g2).unwrap();
    network.add_output(g2);
    network.add_output(!a);
    network
}

#[test]
fn roundtrip_ascii_layout() {
    let network = sequential_network();
    let bytes = write(&network, Layout::Ascii);

    let outcome = parse(&bytes).unwrap();
    let reread = &outcome.network;
    assert_eq!(reread.input_count(), 2);
    assert_eq!(reread.latch_count(), 1);
    assert_eq!(reread.output_count(), 2);
    assert_eq!(reread.and_count(), 2);
    assert_eq!(reread.output_driver(1), !reread.input(0));
    assert_eq!(reread.latch_next(0), Some(!reread.output_driver(0)));
    assert_acyclic(reread);

    // The reread network assigns the same canonical numbering, so writing
    // it again reproduces the file byte for byte.
    assert_eq!(write(reread, Layout::Ascii), bytes);
}

#[test]
fn roundtrip_delta_layout() {
    let network = sequential_network();
    let bytes = write(&network, Layout::DeltaCoded);
    assert!(bytes.starts_with(b"aig2 5 2 1 2 2\n"));

    let outcome = parse(&bytes).unwrap();
    let reread = &outcome.network;
    assert_eq!(reread.input_count(), 2);
    assert_eq!(reread.latch_count(), 1);
    assert_eq!(reread.output_count(), 2);
    assert_eq!(reread.and_count(), 2);
    assert_acyclic(reread);

    assert_eq!(write(reread, Layout::DeltaCoded), bytes);

    // Both layouts carry the same graph.
    assert_eq!(write(reread, Layout::Ascii), write(&network, Layout::Ascii));
}

/// The delta-coded driver block must handle literal sequences that
/// decrease, e.g. an output listed after a higher gate literal.
#[test]
fn delta_layout_with_decreasing_literals() {
    let mut network = Network::new();
    let a = network.add_input();
    let b = network.add_input();
    let g = network.and2(a, b);
    network.add_output(g);
    network.add_output(a);

    let bytes = write(&network, Layout::DeltaCoded);
    // Driver literals 6, 2: raw 6, then magnitude 4 with the sign bit.
    assert_eq!(bytes, b"aig2 3 2 0 2 1\n\x06\x09\x02\x02");

    let outcome = parse(&bytes).unwrap();
    assert_eq!(outcome.network.output_driver(1), outcome.network.input(0));
}

#[test]
fn duplicate_gates_are_shared() {
    // Two gate slots with the identical fanin pair; structural hashing
    // collapses them to one network gate referenced by both outputs.
    let bytes = b"aig 4 2 0 2 2\n6\n8\n\x02\x02\x04\x02";
    let outcome = parse(bytes).unwrap();
    let network = &outcome.network;

    assert_eq!(network.and_count(), 1);
    assert_eq!(network.output_driver(0), network.output_driver(1));
    assert_acyclic(network);
}

#[test]
fn symbols_and_comment() {
    let bytes = b"aig 1 1 0 1 0\n2\ni0 carry_in\no0 sum\nc\nbuilt by hand\nfor this test\n";
    let outcome = parse(bytes).unwrap();
    let network = &outcome.network;

    assert_eq!(network.input_name(0), Some("carry_in"));
    assert_eq!(network.output_name(0), Some("sum"));
    assert_eq!(network.input_label(0), "carry_in");
    assert_eq!(
        outcome.comment.as_deref(),
        Some("built by hand\nfor this test")
    );
}

#[test]
fn symbols_roundtrip() {
    let mut network = sequential_network();
    network.set_input_name(1, "enable");
    network.set_latch_name(0, "state");
    network.set_output_name(0, "valid");

    let bytes = write(&network, Layout::Ascii);
    let outcome = parse(&bytes).unwrap();
    let reread = &outcome.network;

    assert_eq!(reread.input_name(0), None);
    assert_eq!(reread.input_name(1), Some("enable"));
    assert_eq!(reread.latch_name(0), Some("state"));
    assert_eq!(reread.output_name(0), Some("valid"));
    assert_eq!(reread.output_name(1), None);
    // Unnamed entries fall back to generated short names.
    assert_eq!(reread.input_label(0), "i0");
    assert_eq!(reread.output_label(1), "o1");

    assert_eq!(write(reread, Layout::Ascii), bytes);
}

#[test]
fn comment_roundtrip() {
    let network = sequential_network();
    let mut buf = vec![];
    let mut writer = binary::Writer::from_write(&mut buf, Layout::Ascii);
    writer.write_network(&network);
    writer.write_comment("generated\nby a test");
    writer.finish().unwrap();

    let outcome = parse(&buf).unwrap();
    assert_eq!(outcome.comment.as_deref(), Some("generated\nby a test"));
}

#[test]
fn bad_state_and_constraints_fold_into_outputs() {
    let bytes = b"aig 1 1 0 1 0 1 2\n2\n3\n0\n1\nb0 never\nc0 assume_a\nc1 assume_b\n";
    let outcome = parse(bytes).unwrap();
    let network = &outcome.network;

    assert_eq!(network.output_count(), 4);
    assert_eq!(network.output_driver(0), network.input(0));
    assert_eq!(network.output_driver(1), !network.input(0));
    assert_eq!(network.output_driver(2), network.const_false());
    assert_eq!(network.output_driver(3), network.const_true());

    assert_eq!(
        outcome.warnings,
        [
            Warning::BadStateFolded { count: 1 },
            Warning::ConstraintsFolded { count: 2 },
        ]
    );

    assert_eq!(network.output_name(1), Some("never"));
    assert_eq!(network.output_name(2), Some("assume_a"));
    assert_eq!(network.output_name(3), Some("assume_b"));
}

#[test]
fn header_is_validated_eagerly() {
    let parser = binary::Parser::from_read(
        b"aig 5 2 1 2 2\n".as_slice(),
        Config::default(),
    )
    .unwrap();
    let header = parser.header();
    assert_eq!(header.layout, Layout::Ascii);
    assert_eq!(header.max_var_index, 5);
    assert_eq!(header.input_count, 2);
    assert_eq!(header.latch_count, 1);
    assert_eq!(header.output_count, 2);
    assert_eq!(header.and_gate_count, 2);
    assert_eq!(header.folded_output_count(), 2);
}

#[test]
fn rejects_inconsistent_header() {
    // 5 != 2 + 0 + 2
    assert_matches!(
        *parse(b"aig 5 2 0 1 2\n").unwrap_err(),
        InnerReadError::HeaderInconsistent { .. }
    );
}

#[test]
fn rejects_nonnumeric_header_field() {
    assert_matches!(
        *parse(b"aig x 2 0 1 2\n").unwrap_err(),
        InnerReadError::HeaderInconsistent { .. }
    );
}

#[test]
fn rejects_leading_zero_header_field() {
    assert_matches!(
        *parse(b"aig 2 01 0 1 1\n").unwrap_err(),
        InnerReadError::HeaderInconsistent { .. }
    );
}

#[test]
fn rejects_missing_header_newline() {
    assert_matches!(
        *parse(b"aig 2 1 0 1 1").unwrap_err(),
        InnerReadError::HeaderInconsistent { .. }
    );
}

#[test]
fn rejects_justice_and_fairness() {
    assert_matches!(
        *parse(b"aig 2 1 0 1 1 0 0 1\n").unwrap_err(),
        InnerReadError::UnsupportedFeature { .. }
    );
    assert_matches!(
        *parse(b"aig 2 1 0 1 1 0 0 0 1\n").unwrap_err(),
        InnerReadError::UnsupportedFeature { .. }
    );
}

#[test]
fn rejects_unknown_tag() {
    assert_matches!(
        *parse(b"agi 2 1 0 1 1\n").unwrap_err(),
        InnerReadError::Syntax(_)
    );
}

#[test]
fn rejects_gate_stream_truncated_mid_varint() {
    assert_matches!(
        *parse(b"aig 2 1 0 1 1\n4\n\x82").unwrap_err(),
        InnerReadError::MalformedVarint { .. }
    );
}

#[test]
fn rejects_missing_gates() {
    // Three gates declared, two present.
    assert_matches!(
        *parse(b"aig 5 2 0 1 3\n6\n\x02\x02\x02\x05").unwrap_err(),
        InnerReadError::TruncatedStream { .. }
    );
}

#[test]
fn rejects_missing_driver_literal_lines() {
    assert_matches!(
        *parse(b"aig 1 1 0 2 0\n2\n").unwrap_err(),
        InnerReadError::TruncatedStream { .. }
    );
}

#[test]
fn rejects_truncated_delta_block() {
    assert_matches!(
        *parse(b"aig2 1 1 0 1 0\n\x80").unwrap_err(),
        InnerReadError::MalformedVarint { .. }
    );
}

#[test]
fn rejects_delta_exceeding_reference() {
    // First delta 5 exceeds the gate literal 4.
    assert_matches!(
        *parse(b"aig 2 1 0 1 1\n4\n\x05\x00").unwrap_err(),
        InnerReadError::DanglingReference { .. }
    );
}

#[test]
fn rejects_self_referential_gate() {
    // Zero delta makes the gate its own fanin.
    assert_matches!(
        *parse(b"aig 2 1 0 1 1\n4\n\x00\x00").unwrap_err(),
        InnerReadError::DanglingReference { .. }
    );
}

#[test]
fn rejects_out_of_range_driver_literal() {
    // Maximum literal for one variable is 3.
    assert_matches!(
        *parse(b"aig 1 1 0 1 0\n9\n").unwrap_err(),
        InnerReadError::DanglingReference { .. }
    );
}

#[test]
fn rejects_out_of_range_delta_coded_driver() {
    // Delta-coded driver block decodes to literal 8, past variable 1.
    assert_matches!(
        *parse(b"aig2 1 1 0 1 0\n\x08").unwrap_err(),
        InnerReadError::DanglingReference { .. }
    );
}

#[test]
fn rejects_trailing_garbage() {
    assert_matches!(
        *parse(b"aig 1 1 0 1 0\n2\nx\n").unwrap_err(),
        InnerReadError::Syntax(_)
    );
}

#[test]
fn rejects_symbol_index_past_count() {
    assert_matches!(
        *parse(b"aig 1 1 0 1 0\n2\ni1 name\n").unwrap_err(),
        InnerReadError::Syntax(_)
    );
}
