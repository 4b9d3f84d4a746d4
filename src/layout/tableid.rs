use strum::{EnumCount, EnumIter};

/// One past the highest table identifier; the length of dense per-table arrays.
///
/// Table ids are sparse (ECMA-335 leaves 0x13, 0x16, and 0x2D-0x2F unassigned within the
/// used range), so arrays indexed by discriminant carry a few permanently zero slots.
pub const TABLE_ID_LIMIT: usize = 0x38;

/// Row count for every table kind, indexed by [`TableId`] discriminant.
///
/// Slots for unassigned ids must stay zero; [`crate::layout::MetadataSizes`] only ever
/// reads the slots a [`TableId`] maps to.
pub type RowCounts = [u32; TABLE_ID_LIMIT];

/// Identifiers for the metadata tables defined in ECMA-335 and the Portable PDB format.
///
/// Each variant's numeric value is the table id from the specification; it doubles as the
/// table's bit position in the `Valid`/`Sorted` bitmasks of the table stream header and as
/// the index into dense per-table arrays like [`RowCounts`].
///
/// ## Table Categories
///
/// - **Type system** (0x00-0x2C): types, members, signatures, assemblies, resources
/// - **Pointer indirections** (0x03, 0x05, 0x07, 0x13, 0x16): reserved slots for
///   uncompressed `#-` layouts; never populated by this writer
/// - **Edit-and-continue** (0x1E, 0x1F): `EncLog`/`EncMap` rows of a minimal delta
/// - **Debug** (0x30-0x37): Portable PDB tables, emitted into standalone debug metadata
///
/// ## Reference
/// * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata Tables
/// * [Portable PDB Format](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md)
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
pub enum TableId {
    /// `Module` table (0x00) - The current module; exactly one row.
    Module = 0x00,

    /// `TypeRef` table (0x01) - References to types defined in external assemblies.
    TypeRef = 0x01,

    /// `TypeDef` table (0x02) - Definitions of types within this assembly.
    TypeDef = 0x02,

    /// `FieldPtr` table (0x03) - Field indirection for uncompressed layouts.
    ///
    /// Reserved slot; this writer never emits rows for it.
    FieldPtr = 0x03,

    /// `Field` table (0x04) - Field definitions within types.
    Field = 0x04,

    /// `MethodPtr` table (0x05) - Method indirection for uncompressed layouts.
    ///
    /// Reserved slot; this writer never emits rows for it.
    MethodPtr = 0x05,

    /// `MethodDef` table (0x06) - Method definitions, including flags, name,
    /// signature, and the RVA of the method body when one exists.
    MethodDef = 0x06,

    /// `ParamPtr` table (0x07) - Parameter indirection for uncompressed layouts.
    ///
    /// Reserved slot; this writer never emits rows for it.
    ParamPtr = 0x07,

    /// `Param` table (0x08) - Parameter definitions for methods.
    Param = 0x08,

    /// `InterfaceImpl` table (0x09) - Interface implementations by types.
    InterfaceImpl = 0x09,

    /// `MemberRef` table (0x0A) - References to members of external types or modules.
    MemberRef = 0x0A,

    /// `Constant` table (0x0B) - Compile-time constant values for fields, parameters,
    /// and properties.
    Constant = 0x0B,

    /// `CustomAttribute` table (0x0C) - Custom attribute applications, pairing an
    /// attributed parent with the attribute constructor and value blob.
    CustomAttribute = 0x0C,

    /// `FieldMarshal` table (0x0D) - Marshalling descriptors for interop fields and
    /// parameters.
    FieldMarshal = 0x0D,

    /// `DeclSecurity` table (0x0E) - Declarative security permission sets.
    DeclSecurity = 0x0E,

    /// `ClassLayout` table (0x0F) - Explicit packing and size information for types.
    ClassLayout = 0x0F,

    /// `FieldLayout` table (0x10) - Explicit byte offsets of fields within their type.
    FieldLayout = 0x10,

    /// `StandAloneSig` table (0x11) - Standalone signatures (locals, indirect calls).
    StandAloneSig = 0x11,

    /// `EventMap` table (0x12) - Mapping from types to their event ranges.
    EventMap = 0x12,

    /// `EventPtr` table (0x13) - Event indirection for uncompressed layouts.
    ///
    /// Reserved slot; this writer never emits rows for it.
    EventPtr = 0x13,

    /// `Event` table (0x14) - Event definitions within types.
    Event = 0x14,

    /// `PropertyMap` table (0x15) - Mapping from types to their property ranges.
    PropertyMap = 0x15,

    /// `PropertyPtr` table (0x16) - Property indirection for uncompressed layouts.
    ///
    /// Reserved slot; this writer never emits rows for it.
    PropertyPtr = 0x16,

    /// `Property` table (0x17) - Property definitions within types.
    Property = 0x17,

    /// `MethodSemantics` table (0x18) - Associates getter/setter/adder-style methods
    /// with their property or event.
    MethodSemantics = 0x18,

    /// `MethodImpl` table (0x19) - Explicit method implementation mappings.
    MethodImpl = 0x19,

    /// `ModuleRef` table (0x1A) - References to external modules, primarily for P/Invoke.
    ModuleRef = 0x1A,

    /// `TypeSpec` table (0x1B) - Type specifications (instantiated generics, arrays).
    TypeSpec = 0x1B,

    /// `ImplMap` table (0x1C) - P/Invoke mappings from managed methods to native
    /// entry points.
    ImplMap = 0x1C,

    /// `FieldRVA` table (0x1D) - Relative virtual addresses of fields with initial data.
    FieldRVA = 0x1D,

    /// `EncLog` table (0x1E) - Edit-and-continue log; rows only appear in deltas.
    EncLog = 0x1E,

    /// `EncMap` table (0x1F) - Edit-and-continue token map; rows only appear in deltas.
    EncMap = 0x1F,

    /// `Assembly` table (0x20) - The current assembly's identity; at most one row.
    Assembly = 0x20,

    /// `AssemblyProcessor` table (0x21) - Obsolete ECMA slot, never populated.
    AssemblyProcessor = 0x21,

    /// `AssemblyOS` table (0x22) - Obsolete ECMA slot, never populated.
    AssemblyOS = 0x22,

    /// `AssemblyRef` table (0x23) - References to external assemblies.
    AssemblyRef = 0x23,

    /// `AssemblyRefProcessor` table (0x24) - Obsolete ECMA slot, never populated.
    AssemblyRefProcessor = 0x24,

    /// `AssemblyRefOS` table (0x25) - Obsolete ECMA slot, never populated.
    AssemblyRefOS = 0x25,

    /// `File` table (0x26) - Files that are part of a multi-file assembly.
    File = 0x26,

    /// `ExportedType` table (0x27) - Types exported or forwarded by this assembly.
    ExportedType = 0x27,

    /// `ManifestResource` table (0x28) - Embedded or linked resources.
    ManifestResource = 0x28,

    /// `NestedClass` table (0x29) - Parent/child nesting relationships between types.
    NestedClass = 0x29,

    /// `GenericParam` table (0x2A) - Generic parameter definitions.
    GenericParam = 0x2A,

    /// `MethodSpec` table (0x2B) - Instantiated generic methods.
    MethodSpec = 0x2B,

    /// `GenericParamConstraint` table (0x2C) - Constraints on generic parameters.
    GenericParamConstraint = 0x2C,

    /// `Document` table (0x30) - Source documents referenced by debug information.
    Document = 0x30,

    /// `MethodDebugInformation` table (0x31) - Sequence points per method.
    MethodDebugInformation = 0x31,

    /// `LocalScope` table (0x32) - Lexical scopes of local variables and constants.
    LocalScope = 0x32,

    /// `LocalVariable` table (0x33) - Local variable names and attributes.
    LocalVariable = 0x33,

    /// `LocalConstant` table (0x34) - Local constant names and values.
    LocalConstant = 0x34,

    /// `ImportScope` table (0x35) - Namespace import scopes.
    ImportScope = 0x35,

    /// `StateMachineMethod` table (0x36) - Kickoff methods of async/iterator state
    /// machines.
    StateMachineMethod = 0x36,

    /// `CustomDebugInformation` table (0x37) - Open-ended debug information records.
    CustomDebugInformation = 0x37,
}

impl TableId {
    /// This table's bit in the `Valid`/`Sorted` bitmasks of the table stream header.
    #[must_use]
    pub fn bit(self) -> u64 {
        1u64 << (self as usize)
    }

    /// True for the Portable PDB debug tables (0x30-0x37).
    ///
    /// In standalone debug metadata these are the tables stored in the stream itself;
    /// all other present tables are only referenced and live in the companion
    /// type-system stream.
    #[must_use]
    pub fn is_debug(self) -> bool {
        (self as usize) >= TableId::Document as usize
    }

    /// True for reserved or obsolete slots this format generation never populates.
    ///
    /// Observing a nonzero row count for one of these is a fatal invariant violation in
    /// the upstream table population logic.
    #[must_use]
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            TableId::FieldPtr
                | TableId::MethodPtr
                | TableId::ParamPtr
                | TableId::EventPtr
                | TableId::PropertyPtr
                | TableId::AssemblyProcessor
                | TableId::AssemblyOS
                | TableId::AssemblyRefProcessor
                | TableId::AssemblyRefOS
        )
    }
}
