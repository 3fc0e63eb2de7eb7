//! The canonical opcode dispatch table.
//!
//! One table, three disjoint key spaces (single-byte, named, binary
//! code), looked up according to the record's format. Each entry pairs a
//! payload parser with a static declaration of its coordinate width and
//! mode; the dispatcher sets the coordinate cursor's per-record width
//! from this declaration before resolution.

use super::{attributes, block_ref, geometry, ParseResult, ParsedPayload};
use crate::coords::{CoordMode, Width};
use crate::io::{OpcodeIdentity, RecordFormat};
use ahash::AHashMap;
use once_cell::sync::Lazy;

/// Version of the shipped opcode repertoire.
pub const TABLE_VERSION: u32 = 1;

/// How a single-byte record's payload is bounded.
///
/// Single-byte records have no length field, so the decoder consults this
/// hint. Extended records are self-delimiting and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadExtent {
    /// No payload
    None,
    /// Exactly this many bytes
    Fixed(usize),
    /// A u8 point count followed by that many fixed-size points
    CountPrefixed {
        /// Encoded size of each point
        bytes_per_point: usize,
    },
}

/// A registered payload parser.
pub type PayloadParser = fn(&[u8], RecordFormat) -> ParseResult<ParsedPayload>;

/// One table entry: the parser plus its static coordinate declaration.
#[derive(Clone, Copy)]
pub struct OpcodeDecl {
    /// Width of the record's coordinate encoding
    pub width: Width,
    /// Whether coordinates are deltas or absolute
    pub mode: CoordMode,
    /// Payload extent hint for single-byte records
    pub extent: PayloadExtent,
    /// The pure payload parser
    pub parser: PayloadParser,
}

impl OpcodeDecl {
    const fn new(width: Width, mode: CoordMode, extent: PayloadExtent, parser: PayloadParser) -> Self {
        Self {
            width,
            mode,
            extent,
            parser,
        }
    }

    /// An attribute/control entry: coordinates are irrelevant.
    const fn plain(extent: PayloadExtent, parser: PayloadParser) -> Self {
        Self::new(Width::Bit32, CoordMode::Absolute, extent, parser)
    }
}

/// The three lookup spaces.
pub struct OpcodeTable {
    single_byte: AHashMap<u8, OpcodeDecl>,
    named: AHashMap<&'static str, OpcodeDecl>,
    binary: AHashMap<u16, OpcodeDecl>,
}

impl OpcodeTable {
    /// Look up the entry for a record identity.
    pub fn lookup(&self, identity: &OpcodeIdentity) -> Option<&OpcodeDecl> {
        match identity {
            OpcodeIdentity::SingleByte(b) => self.single_byte.get(b),
            OpcodeIdentity::Named(name) => self.named.get(name.as_str()),
            OpcodeIdentity::BinaryCode(code) => self.binary.get(code),
        }
    }

    /// Payload extent hint for a single-byte opcode; unknown opcodes have
    /// no bounded payload and flow to the unknown-opcode diagnostic path.
    pub fn single_byte_extent(&self, opcode: u8) -> PayloadExtent {
        self.single_byte
            .get(&opcode)
            .map(|decl| decl.extent)
            .unwrap_or(PayloadExtent::None)
    }

    /// Number of registered entries across all three key spaces.
    pub fn len(&self) -> usize {
        self.single_byte.len() + self.named.len() + self.binary.len()
    }

    /// Whether the table is empty (it never is for the standard table).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The standard versioned repertoire.
pub fn standard_table() -> &'static OpcodeTable {
    static TABLE: Lazy<OpcodeTable> = Lazy::new(build_standard_table);
    &TABLE
}

fn build_standard_table() -> OpcodeTable {
    use CoordMode::{Absolute, Relative};
    use PayloadExtent::{CountPrefixed, Fixed, None as NoPayload};
    use Width::{Bit16, Bit32};

    let mut single_byte: AHashMap<u8, OpcodeDecl> = AHashMap::new();
    let mut named: AHashMap<&'static str, OpcodeDecl> = AHashMap::new();
    let mut binary: AHashMap<u16, OpcodeDecl> = AHashMap::new();

    let pt16 = CountPrefixed { bytes_per_point: 4 };
    let pt32 = CountPrefixed { bytes_per_point: 8 };

    // Single-byte geometry. Upper case: 32-bit absolute; lower case:
    // 16-bit relative.
    single_byte.insert(b'L', OpcodeDecl::new(Bit32, Absolute, Fixed(16), geometry::parse_line32));
    single_byte.insert(b'l', OpcodeDecl::new(Bit16, Relative, Fixed(8), geometry::parse_line16));
    single_byte.insert(b'P', OpcodeDecl::new(Bit32, Absolute, pt32, geometry::parse_polyline32));
    single_byte.insert(b'p', OpcodeDecl::new(Bit16, Relative, pt16, geometry::parse_polyline16));
    single_byte.insert(b'G', OpcodeDecl::new(Bit32, Absolute, pt32, geometry::parse_polygon32));
    single_byte.insert(b'g', OpcodeDecl::new(Bit16, Relative, pt16, geometry::parse_polygon16));
    single_byte.insert(b'T', OpcodeDecl::new(Bit32, Absolute, pt32, geometry::parse_fan32));
    single_byte.insert(b't', OpcodeDecl::new(Bit16, Relative, pt16, geometry::parse_fan16));
    single_byte.insert(b'B', OpcodeDecl::new(Bit32, Absolute, pt32, geometry::parse_bezier32));
    single_byte.insert(b'b', OpcodeDecl::new(Bit16, Relative, pt16, geometry::parse_bezier16));
    single_byte.insert(b'R', OpcodeDecl::new(Bit32, Absolute, Fixed(12), geometry::parse_circle32));
    single_byte.insert(b'r', OpcodeDecl::new(Bit16, Relative, Fixed(6), geometry::parse_circle16));

    // Single-byte attribute/control.
    single_byte.insert(b'O', OpcodeDecl::plain(Fixed(8), attributes::parse_origin));
    single_byte.insert(0x03, OpcodeDecl::plain(Fixed(4), attributes::parse_stroke_color));
    single_byte.insert(b'F', OpcodeDecl::plain(NoPayload, attributes::parse_fill_on));
    single_byte.insert(b'f', OpcodeDecl::plain(NoPayload, attributes::parse_fill_off));
    single_byte.insert(b'V', OpcodeDecl::plain(NoPayload, attributes::parse_visibility_on));
    single_byte.insert(b'v', OpcodeDecl::plain(NoPayload, attributes::parse_visibility_off));
    single_byte.insert(b'S', OpcodeDecl::plain(NoPayload, attributes::parse_save));
    single_byte.insert(b's', OpcodeDecl::plain(NoPayload, attributes::parse_restore));
    single_byte.insert(b'Z', OpcodeDecl::plain(NoPayload, attributes::parse_reset));

    // Named geometry; `Rel` prefix marks the 16-bit relative variants.
    named.insert("Line", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_line32));
    named.insert("RelLine", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_line16));
    named.insert("Polyline", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_polyline32));
    named.insert("RelPolyline", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_polyline16));
    named.insert("Polygon", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_polygon32));
    named.insert("RelPolygon", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_polygon16));
    named.insert("PolyTriangle", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_fan32));
    named.insert("RelPolyTriangle", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_fan16));
    named.insert("Bezier", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_bezier32));
    named.insert("RelBezier", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_bezier16));
    named.insert("Circle", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_circle32));
    named.insert("RelCircle", OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_circle16));
    named.insert("Ellipse", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_ellipse));
    named.insert("Arc", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_arc));
    named.insert("Text", OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_text));

    // Named attributes, controls, and metadata.
    named.insert("Color", OpcodeDecl::plain(NoPayload, attributes::parse_stroke_color));
    named.insert("FillColor", OpcodeDecl::plain(NoPayload, attributes::parse_fill_color));
    named.insert("LineWeight", OpcodeDecl::plain(NoPayload, attributes::parse_line_weight));
    named.insert("LinePattern", OpcodeDecl::plain(NoPayload, attributes::parse_line_pattern));
    named.insert("Fill", OpcodeDecl::plain(NoPayload, attributes::parse_fill_mode));
    named.insert("Visibility", OpcodeDecl::plain(NoPayload, attributes::parse_visibility));
    named.insert("Layer", OpcodeDecl::plain(NoPayload, attributes::parse_layer));
    named.insert("Font", OpcodeDecl::plain(NoPayload, attributes::parse_font));
    named.insert("Clip", OpcodeDecl::plain(NoPayload, attributes::parse_clip));
    named.insert("Origin", OpcodeDecl::plain(NoPayload, attributes::parse_origin));
    named.insert("Units", OpcodeDecl::plain(NoPayload, attributes::parse_units));
    named.insert("SheetSize", OpcodeDecl::plain(NoPayload, attributes::parse_sheet_size));
    named.insert("Save", OpcodeDecl::plain(NoPayload, attributes::parse_save));
    named.insert("Restore", OpcodeDecl::plain(NoPayload, attributes::parse_restore));
    named.insert("Reset", OpcodeDecl::plain(NoPayload, attributes::parse_reset));

    // Extended-binary geometry.
    binary.insert(0x0100, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_line32));
    binary.insert(0x0101, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_line16));
    binary.insert(0x0102, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_polyline32));
    binary.insert(0x0103, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_polyline16));
    binary.insert(0x0104, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_polygon32));
    binary.insert(0x0105, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_polygon16));
    binary.insert(0x0106, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_circle32));
    binary.insert(0x0107, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_circle16));
    binary.insert(0x0108, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_ellipse));
    binary.insert(0x0109, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_arc));
    binary.insert(0x010B, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_fan32));
    binary.insert(0x010C, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_fan16));
    binary.insert(0x010D, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_fan_shaded));
    binary.insert(0x010E, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_bezier32));
    binary.insert(0x010F, OpcodeDecl::new(Bit16, Relative, NoPayload, geometry::parse_bezier16));
    binary.insert(0x0110, OpcodeDecl::new(Bit32, Absolute, NoPayload, geometry::parse_text));

    // Extended-binary attributes, metadata, and controls.
    binary.insert(0x0201, OpcodeDecl::plain(NoPayload, attributes::parse_stroke_color));
    binary.insert(0x0202, OpcodeDecl::plain(NoPayload, attributes::parse_fill_color));
    binary.insert(0x0203, OpcodeDecl::plain(NoPayload, attributes::parse_line_weight));
    binary.insert(0x0204, OpcodeDecl::plain(NoPayload, attributes::parse_line_pattern));
    binary.insert(0x0205, OpcodeDecl::plain(NoPayload, attributes::parse_layer));
    binary.insert(0x0206, OpcodeDecl::plain(NoPayload, attributes::parse_visibility));
    binary.insert(0x0207, OpcodeDecl::plain(NoPayload, attributes::parse_fill_mode));
    binary.insert(0x0208, OpcodeDecl::plain(NoPayload, attributes::parse_clip));
    binary.insert(0x0209, OpcodeDecl::plain(NoPayload, attributes::parse_font));
    binary.insert(0x0301, OpcodeDecl::plain(NoPayload, attributes::parse_origin));
    binary.insert(0x0302, OpcodeDecl::plain(NoPayload, attributes::parse_units));
    binary.insert(0x0303, OpcodeDecl::plain(NoPayload, attributes::parse_sheet_size));
    binary.insert(0x0401, OpcodeDecl::plain(NoPayload, block_ref::parse_block_ref));
    binary.insert(0x0501, OpcodeDecl::plain(NoPayload, attributes::parse_save));
    binary.insert(0x0502, OpcodeDecl::plain(NoPayload, attributes::parse_restore));
    binary.insert(0x0503, OpcodeDecl::plain(NoPayload, attributes::parse_reset));

    OpcodeTable {
        single_byte,
        named,
        binary,
    }
}
