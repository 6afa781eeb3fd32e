//! Reading and writing of the binary AIGER format.
//!
//! The reader does not reproduce the flat gate list of the file. Instead
//! every decoded gate is pushed through [`strash::Network::and2`], so the
//! returned network is structurally hashed: duplicated gates are shared
//! and gates that the simplification laws collapse never materialize. A
//! slot map from file variables to network references keeps the file
//! numbering intact while the network numbering is free to shrink.

use std::{
    fmt,
    io::{BufReader, Read, Write},
};

use flussab::{text::LineReader, DeferredReader, DeferredWriter, Parsed::Fallthrough};
use strash::{AigNode, Network, NodeRef};

use crate::{token, varint, ReadError, WriteError};

/// Largest maximum-variable-index a file may declare; literals of larger
/// variables would not fit the 32 bit literal space.
const MAX_VAR_INDEX: usize = (NodeRef::MAX_INDEX - 1) as usize;

#[derive(Default)]
#[non_exhaustive]
pub struct Config {}

/// Selects how the latch and output driver literals are stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layout {
    /// Header tag `aig`: one ASCII literal per line ahead of the gate
    /// section.
    Ascii,
    /// Header tag `aig2`: a single delta-coded literal block ahead of the
    /// gate section.
    DeltaCoded,
}

impl Layout {
    fn tag(self) -> &'static [u8] {
        match self {
            Layout::Ascii => b"aig",
            Layout::DeltaCoded => b"aig2",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Header {
    pub layout: Layout,
    pub max_var_index: usize,
    pub input_count: usize,
    pub latch_count: usize,
    pub output_count: usize,
    pub and_gate_count: usize,
    pub bad_state_count: usize,
    pub constraint_count: usize,
    pub justice_count: usize,
    pub fairness_count: usize,
}

impl Header {
    /// All combinational outputs the body stores driver literals for:
    /// declared outputs plus the folded bad-state and constraint outputs.
    pub fn folded_output_count(&self) -> usize {
        self.output_count + self.bad_state_count + self.constraint_count
    }

    fn parse(reader: &mut LineReader) -> Result<Self, ReadError> {
        // "aig" is a prefix of "aig2", so the longer tag goes first.
        let layout = token::fixed(reader, b"aig2")
            .map(|_| Layout::DeltaCoded)
            .or_parse(|| token::fixed(reader, b"aig").map(|_| Layout::Ascii))
            .or_give_up(|| token::unexpected(reader, "binary AIGER header tag \"aig\" or \"aig2\""))?;

        let line_start = reader.reader.position();

        token::header_space(reader)?;
        let max_var_index = token::header_field(reader, "maximum variable index")?;

        token::header_space(reader)?;
        let input_count = token::header_field(reader, "input count")?;

        token::header_space(reader)?;
        let latch_count = token::header_field(reader, "latch count")?;

        token::header_space(reader)?;
        let output_count = token::header_field(reader, "output count")?;

        token::header_space(reader)?;
        let and_gate_count = token::header_field(reader, "and gate count")?;

        let mut bad_state_count = 0;
        let mut constraint_count = 0;
        let mut justice_count = 0;
        let mut fairness_count = 0;

        #[allow(clippy::never_loop)]
        loop {
            if !token::header_newline_or_space(reader)? {
                break;
            }
            bad_state_count = token::header_field(reader, "bad state property count")?;

            if !token::header_newline_or_space(reader)? {
                break;
            }
            constraint_count = token::header_field(reader, "invariant constraint count")?;

            if !token::header_newline_or_space(reader)? {
                break;
            }
            justice_count = token::header_field(reader, "justice property count")?;

            if !token::header_newline_or_space(reader)? {
                break;
            }
            fairness_count = token::header_field(reader, "fairness constraint count")?;

            token::header_newline(reader)?;
            break;
        }

        if max_var_index > MAX_VAR_INDEX {
            return Err(token::header_error(
                reader,
                line_start,
                format!(
                    "maximum variable index {max_var_index} exceeds the supported maximum {MAX_VAR_INDEX}"
                ),
            ));
        }

        let declared = input_count
            .checked_add(latch_count)
            .and_then(|sum| sum.checked_add(and_gate_count));
        if declared != Some(max_var_index) {
            return Err(token::header_error(
                reader,
                line_start,
                format!(
                    "maximum variable index {max_var_index} does not equal the sum of \
                     {input_count} inputs, {latch_count} latches and {and_gate_count} and gates"
                ),
            ));
        }

        if justice_count > 0 || fairness_count > 0 {
            return Err(token::unsupported(
                reader,
                line_start,
                format!(
                    "justice ({justice_count}) and fairness ({fairness_count}) properties are not \
                     supported"
                ),
            ));
        }

        Ok(Header {
            layout,
            max_var_index,
            input_count,
            latch_count,
            output_count,
            and_gate_count,
            bad_state_count,
            constraint_count,
            justice_count,
            fairness_count,
        })
    }
}

/// Accepted deviations the reader reports alongside the parsed network.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Warning {
    /// Bad-state property outputs were folded into the output list.
    BadStateFolded {
        /// Number of folded bad-state outputs.
        count: usize,
    },
    /// Invariant constraint outputs were folded into the output list.
    /// Constraint polarity is left untouched; inverting constraints is a
    /// separate post-processing step.
    ConstraintsFolded {
        /// Number of folded constraint outputs.
        count: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::BadStateFolded { count } => {
                write!(f, "{count} bad state properties folded into the output list")
            }
            Warning::ConstraintsFolded { count } => {
                write!(f, "{count} invariant constraints folded into the output list")
            }
        }
    }
}

/// Everything recovered from one binary AIGER file.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The structurally hashed network, swept of unreachable gates.
    pub network: Network,
    /// Accepted deviations encountered while parsing.
    pub warnings: Vec<Warning>,
    /// The trailing comment section, when present.
    pub comment: Option<String>,
}

enum SymbolTarget {
    Input(usize),
    Latch(usize),
    Output(usize),
}

/// Parser for the binary AIGER format.
pub struct Parser<'a> {
    reader: LineReader<'a>,
    header: Header,
}

impl<'a> Parser<'a> {
    /// Creates a parser reading from a [`BufReader`].
    pub fn from_buf_reader(
        buf_reader: BufReader<impl Read + 'a>,
        config: Config,
    ) -> Result<Self, ReadError> {
        Self::new(
            LineReader::new(DeferredReader::from_buf_reader(buf_reader)),
            config,
        )
    }

    /// Creates a parser reading from a [`Read`] instance.
    ///
    /// If the [`Read`] instance is a [`BufReader`], it is better to use
    /// [`from_buf_reader`][Self::from_buf_reader] to avoid unnecessary
    /// double buffering of the data.
    pub fn from_read(read: impl Read + 'a, config: Config) -> Result<Self, ReadError> {
        Self::new(LineReader::new(DeferredReader::from_read(read)), config)
    }

    /// Creates a parser reading from a boxed [`Read`] instance.
    #[inline(never)]
    pub fn from_boxed_dyn_read(
        read: Box<dyn Read + 'a>,
        config: Config,
    ) -> Result<Self, ReadError> {
        Self::new(
            LineReader::new(DeferredReader::from_boxed_dyn_read(read)),
            config,
        )
    }

    /// Creates a parser reading from a [`LineReader`]. The header line is
    /// parsed and validated immediately.
    pub fn new(mut reader: LineReader<'a>, _config: Config) -> Result<Self, ReadError> {
        let header = Header::parse(&mut reader)?;
        Ok(Self { reader, header })
    }

    /// The parsed and validated header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Parses the remainder of the file into a structurally hashed
    /// network.
    ///
    /// No partially constructed network is ever observable: on error the
    /// parser and everything it built are dropped.
    pub fn parse(mut self) -> Result<ParseOutcome, ReadError> {
        let header = self.header.clone();
        let co_count = header.latch_count + header.folded_output_count();

        let mut warnings = vec![];
        if header.bad_state_count > 0 {
            warnings.push(Warning::BadStateFolded {
                count: header.bad_state_count,
            });
        }
        if header.constraint_count > 0 {
            warnings.push(Warning::ConstraintsFolded {
                count: header.constraint_count,
            });
        }

        let mut network = Network::new();

        // File variable -> network reference. Slot `v` is written exactly
        // when variable `v` is defined, so lookups double as the
        // dangling-reference check.
        let mut slots: Vec<NodeRef> = Vec::with_capacity(header.max_var_index + 1);
        slots.push(network.const_false());
        for _ in 0..header.input_count {
            slots.push(network.add_input());
        }
        for _ in 0..header.latch_count {
            slots.push(network.add_latch());
        }

        let co_lits = self.co_literals(co_count)?;

        for _ in 0..header.and_gate_count {
            let own = (slots.len() as u32) * 2;
            let lit1 = token::gate_delta(&mut self.reader, own, "first fanin delta", "gate literal")?;
            let lit0 = token::gate_delta(
                &mut self.reader,
                lit1,
                "second fanin delta",
                "first fanin literal",
            )?;
            let a = resolve(&mut self.reader, &slots, lit1)?;
            let b = resolve(&mut self.reader, &slots, lit0)?;
            slots.push(network.and2(a, b));
        }

        for (pos, &lit) in co_lits[..header.latch_count].iter().enumerate() {
            let driver = resolve(&mut self.reader, &slots, lit)?;
            network.bind_latch_next(pos, driver)?;
        }
        for &lit in &co_lits[header.latch_count..] {
            let driver = resolve(&mut self.reader, &slots, lit)?;
            network.add_output(driver);
        }

        self.symbols(&mut network)?;
        let comment = self.comment()?;

        network.sweep();

        Ok(ParseOutcome {
            network,
            warnings,
            comment,
        })
    }

    fn co_literals(&mut self, co_count: usize) -> Result<Vec<u32>, ReadError> {
        match self.header.layout {
            Layout::Ascii => {
                let max_lit = (self.header.max_var_index as u32) * 2 + 1;
                let mut lits = Vec::with_capacity(co_count);
                for pos in 0..co_count {
                    let name = if pos < self.header.latch_count {
                        "latch next state literal"
                    } else {
                        "output literal"
                    };
                    let lit = token::co_lit(&mut self.reader, name, max_lit)?;
                    token::required_newline(&mut self.reader)?;
                    lits.push(lit);
                }
                Ok(lits)
            }
            Layout::DeltaCoded => varint::read_delta_block(
                &mut self.reader,
                co_count,
                "delta coded driver literal block",
            ),
        }
    }

    fn symbols(&mut self, network: &mut Network) -> Result<(), ReadError> {
        let header = &self.header;
        let input = &mut self.reader;

        loop {
            let target = if header.input_count > 0 {
                token::fixed(input, b"i")
            } else {
                Fallthrough
            }
            .and_then(|_| {
                token::symbol_index(input, "input index", header.input_count)
                    .map(SymbolTarget::Input)
            })
            .or_parse(|| {
                if header.latch_count > 0 {
                    token::fixed(input, b"l")
                } else {
                    Fallthrough
                }
                .and_then(|_| {
                    token::symbol_index(input, "latch index", header.latch_count)
                        .map(SymbolTarget::Latch)
                })
            })
            .or_parse(|| {
                if header.output_count > 0 {
                    token::fixed(input, b"o")
                } else {
                    Fallthrough
                }
                .and_then(|_| {
                    token::symbol_index(input, "output index", header.output_count)
                        .map(SymbolTarget::Output)
                })
            })
            .or_parse(|| {
                if header.bad_state_count > 0 {
                    token::fixed(input, b"b")
                } else {
                    Fallthrough
                }
                .and_then(|_| {
                    token::symbol_index(input, "bad state property index", header.bad_state_count)
                        .map(|index| SymbolTarget::Output(header.output_count + index))
                })
            })
            .or_parse(|| {
                // A lone "c" line starts the comment section instead.
                if header.constraint_count > 0 {
                    token::fixed_not_eol(input, b"c")
                } else {
                    Fallthrough
                }
                .and_then(|_| {
                    token::symbol_index(
                        input,
                        "invariant constraint index or newline",
                        header.constraint_count,
                    )
                    .map(|index| {
                        SymbolTarget::Output(header.output_count + header.bad_state_count + index)
                    })
                })
            })
            .optional()?;

            let target = match target {
                Some(target) => target,
                None => return Ok(()),
            };

            token::required_space(input)?;
            let name = token::remaining_line_content(input)?;

            match target {
                SymbolTarget::Input(pos) => network.set_input_name(pos, name),
                SymbolTarget::Latch(pos) => network.set_latch_name(pos, name),
                SymbolTarget::Output(pos) => network.set_output_name(pos, name),
            }
        }
    }

    fn comment(&mut self) -> Result<Option<String>, ReadError> {
        let input = &mut self.reader;

        if token::fixed(input, b"c").optional()?.is_some() {
            token::required_newline(input)?;
            Ok(Some(token::remaining_file_content(input)?))
        } else {
            token::eof(input)
                .or_give_up(|| token::unexpected(input, "symbol entry, comment or end of file"))?;
            Ok(None)
        }
    }
}

fn resolve(input: &mut LineReader, slots: &[NodeRef], lit: u32) -> Result<NodeRef, ReadError> {
    match slots.get((lit >> 1) as usize) {
        Some(&r) => Ok(r.xor(lit & 1 != 0)),
        None => Err(token::dangling(
            input,
            input.reader.position(),
            format!(
                "literal {lit} references variable {} past the last defined variable {}",
                lit >> 1,
                slots.len() - 1
            ),
        )),
    }
}

/// Writer for the binary AIGER format.
///
/// IO errors are deferred; they surface in [`finish`][Self::finish].
pub struct Writer<'a> {
    writer: DeferredWriter<'a>,
    layout: Layout,
}

impl<'a> Writer<'a> {
    /// Creates a writer emitting the given layout into a [`Write`]
    /// instance.
    pub fn from_write(write: impl Write + 'a, layout: Layout) -> Self {
        Self::new(DeferredWriter::from_write(write), layout)
    }

    /// Creates a writer emitting the given layout into a
    /// [`DeferredWriter`].
    pub fn new(writer: DeferredWriter<'a>, layout: Layout) -> Self {
        Self { writer, layout }
    }

    /// Writes the complete file body for `network`: header, driver
    /// literals, delta-coded gates and the symbol entries of all
    /// explicitly named inputs, latches and outputs.
    ///
    /// The file numbering is derived here, not taken from the network:
    /// constant, inputs and latches in declaration order, then gates in
    /// network order, which keeps every gate literal above its fanin
    /// literals.
    ///
    /// Panics when a latch of `network` has no bound next-state driver.
    pub fn write_network(&mut self, network: &Network) {
        let codes = file_codes(network);

        let input_count = network.input_count();
        let latch_count = network.latch_count();
        let output_count = network.output_count();
        let and_count = network.and_count();

        self.writer.write_all_defer_err(self.layout.tag());
        for field in [
            input_count + latch_count + and_count,
            input_count,
            latch_count,
            output_count,
            and_count,
        ] {
            self.writer.write_all_defer_err(b" ");
            flussab::write::text::ascii_digits(&mut self.writer, field);
        }
        self.writer.write_all_defer_err(b"\n");

        let mut co_lits = Vec::with_capacity(latch_count + output_count);
        for pos in 0..latch_count {
            let next = match network.latch_next(pos) {
                Some(next) => next,
                None => panic!("latch {pos} has no next state driver"),
            };
            co_lits.push(file_lit(&codes, next));
        }
        for pos in 0..output_count {
            co_lits.push(file_lit(&codes, network.output_driver(pos)));
        }

        match self.layout {
            Layout::Ascii => {
                for &lit in &co_lits {
                    flussab::write::text::ascii_digits(&mut self.writer, lit);
                    self.writer.write_all_defer_err(b"\n");
                }
            }
            Layout::DeltaCoded => varint::write_delta_block(&mut self.writer, &co_lits),
        }

        for (index, node) in network.iter_nodes() {
            if let AigNode::And { fanins } = node {
                let own = codes[index as usize];
                let lit0 = file_lit(&codes, fanins[0]);
                let lit1 = file_lit(&codes, fanins[1]);
                // The larger literal is always subtracted first, regardless
                // of the stored fanin order.
                let (hi, lo) = if lit0 >= lit1 { (lit0, lit1) } else { (lit1, lit0) };
                assert!(hi < own);
                varint::write_uint(&mut self.writer, own - hi);
                varint::write_uint(&mut self.writer, hi - lo);
            }
        }

        for pos in 0..input_count {
            if let Some(name) = network.input_name(pos) {
                self.write_symbol(b"i", pos, name);
            }
        }
        for pos in 0..latch_count {
            if let Some(name) = network.latch_name(pos) {
                self.write_symbol(b"l", pos, name);
            }
        }
        for pos in 0..output_count {
            if let Some(name) = network.output_name(pos) {
                self.write_symbol(b"o", pos, name);
            }
        }
    }

    fn write_symbol(&mut self, prefix: &[u8], pos: usize, name: &str) {
        self.writer.write_all_defer_err(prefix);
        flussab::write::text::ascii_digits(&mut self.writer, pos);
        self.writer.write_all_defer_err(b" ");
        self.writer.write_all_defer_err(name.as_bytes());
        self.writer.write_all_defer_err(b"\n");
    }

    /// Appends a comment section.
    pub fn write_comment(&mut self, comment: &str) {
        self.writer.write_all_defer_err(b"c\n");
        self.writer.write_all_defer_err(comment.as_bytes());
        self.writer.write_all_defer_err(b"\n");
    }

    /// Flushes all buffered output and reports any deferred IO error.
    pub fn finish(mut self) -> Result<(), WriteError> {
        self.writer.flush_defer_err();
        self.writer.check_io_error()
    }
}

/// Assigns the canonical file literal to every network node: constant 0,
/// inputs and latches in declaration order, then gates in network order.
fn file_codes(network: &Network) -> Vec<u32> {
    let mut codes = vec![0u32; network.node_count()];
    let mut next = 2;
    for pos in 0..network.input_count() {
        codes[network.input(pos).index() as usize] = next;
        next += 2;
    }
    for pos in 0..network.latch_count() {
        codes[network.latch(pos).index() as usize] = next;
        next += 2;
    }
    for (index, node) in network.iter_nodes() {
        if matches!(node, AigNode::And { .. }) {
            codes[index as usize] = next;
            next += 2;
        }
    }
    codes
}

fn file_lit(codes: &[u32], r: NodeRef) -> u32 {
    codes[r.index() as usize] | r.is_complemented() as u32
}
