//! Coded index kinds and their encoding parameters.
//!
//! A coded index is a space-efficient cross-table reference: the low bits carry a tag
//! selecting one of several candidate tables, the remaining bits carry the row number.
//! Which tables participate, and in which tag order, is fixed by the specification per
//! index kind; the byte width of the stored field depends on the row counts of every
//! candidate table and is decided by [`crate::layout::MetadataSizes`].
//!
//! ## References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Section II.24.2.6
//! - [Portable PDB Format](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md) - `HasCustomDebugInformation`

use strum::{EnumCount, EnumIter};

use crate::layout::tableid::TableId;

/// All coded index kinds defined by ECMA-335 and the Portable PDB format.
///
/// Each kind names the set of tables one of its values can reference; the discriminant
/// indexes the cached width table inside [`crate::layout::MetadataSizes`].
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexKind {
    /// References `TypeDef`, `TypeRef`, or `TypeSpec`.
    TypeDefOrRef,

    /// References `Field`, `Param`, or `Property` - entities that can carry constants.
    HasConstant,

    /// References any entity that can have custom attributes attached; the widest
    /// coded index with 22 candidate tables.
    HasCustomAttribute,

    /// References `Field` or `Param` - entities that can carry marshalling descriptors.
    HasFieldMarshal,

    /// References `TypeDef`, `MethodDef`, or `Assembly` - targets of declarative
    /// security.
    HasDeclSecurity,

    /// References `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef`, or `TypeSpec` as the
    /// parent of a member reference.
    MemberRefParent,

    /// References `Event` or `Property` - owners of semantic methods.
    HasSemantics,

    /// References `MethodDef` or `MemberRef`.
    MethodDefOrRef,

    /// References `Field` or `MethodDef` - members forwarded to native code.
    MemberForwarded,

    /// References `File`, `AssemblyRef`, or `ExportedType` - where an exported type
    /// is implemented.
    Implementation,

    /// References the constructor of a custom attribute. Tags 0, 1, and 4 are unused
    /// by conforming files but still occupy tag space, so the kind spans five slots.
    CustomAttributeType,

    /// References `Module`, `ModuleRef`, `AssemblyRef`, or `TypeRef` as the scope a
    /// type reference resolves in.
    ResolutionScope,

    /// References `TypeDef` or `MethodDef` - owners of generic parameters.
    TypeOrMethodDef,

    /// References any entity that can have custom debug information attached; spans
    /// the type-system candidates of [`CodedIndexKind::HasCustomAttribute`] plus the
    /// Portable PDB tables.
    HasCustomDebugInformation,
}

impl CodedIndexKind {
    /// The tables a value of this kind can reference, in tag order.
    ///
    /// The position of a table in the returned slice is its tag value.
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            CodedIndexKind::TypeDefOrRef => {
                &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec]
            }
            CodedIndexKind::HasConstant => &[TableId::Field, TableId::Param, TableId::Property],
            CodedIndexKind::HasCustomAttribute => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity, // labeled 'Permission' in the standard PDF; no such table exists
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
            ],
            CodedIndexKind::HasFieldMarshal => &[TableId::Field, TableId::Param],
            CodedIndexKind::HasDeclSecurity => {
                &[TableId::TypeDef, TableId::MethodDef, TableId::Assembly]
            }
            CodedIndexKind::MemberRefParent => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::ModuleRef,
                TableId::MethodDef,
                TableId::TypeSpec,
            ],
            CodedIndexKind::HasSemantics => &[TableId::Event, TableId::Property],
            CodedIndexKind::MethodDefOrRef => &[TableId::MethodDef, TableId::MemberRef],
            CodedIndexKind::MemberForwarded => &[TableId::Field, TableId::MethodDef],
            CodedIndexKind::Implementation => {
                &[TableId::File, TableId::AssemblyRef, TableId::ExportedType]
            }
            CodedIndexKind::CustomAttributeType => &[
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MemberRef,
                TableId::MemberRef,
            ],
            CodedIndexKind::ResolutionScope => &[
                TableId::Module,
                TableId::ModuleRef,
                TableId::AssemblyRef,
                TableId::TypeRef,
            ],
            CodedIndexKind::TypeOrMethodDef => &[TableId::TypeDef, TableId::MethodDef],
            CodedIndexKind::HasCustomDebugInformation => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity,
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
                TableId::Document,
                TableId::LocalScope,
                TableId::LocalVariable,
                TableId::LocalConstant,
                TableId::ImportScope,
            ],
        }
    }

    /// Number of low bits used for the table tag: `ceil(log2(candidate count))`.
    #[must_use]
    pub fn tag_bits(&self) -> u8 {
        let len = self.tables().len() as u32;
        (32 - (len - 1).leading_zeros()) as u8
    }

    /// Encode a reference to `row` of `table` as a value of this kind.
    ///
    /// `row` is the 1-based row number; row 0 encodes a null reference to the first
    /// candidate table.
    ///
    /// # Panics
    /// Panics if `table` is not a candidate of this kind; referencing a foreign table
    /// is a programmer error in the row population logic.
    #[must_use]
    pub fn encode(&self, table: TableId, row: u32) -> u32 {
        let tag = self
            .tables()
            .iter()
            .position(|&candidate| candidate == table)
            .unwrap_or_else(|| panic!("{table:?} is not a candidate of {self:?}"));

        (row << self.tag_bits()) | tag as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_bits_cover_candidates() {
        for kind in CodedIndexKind::iter() {
            let count = kind.tables().len();
            let bits = kind.tag_bits();
            assert!(1usize << bits >= count, "{kind:?}");
            assert!(1usize << (bits - 1) < count, "{kind:?} wastes a tag bit");
        }
    }

    #[test]
    fn known_tag_widths() {
        assert_eq!(CodedIndexKind::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexKind::HasSemantics.tag_bits(), 1);
        assert_eq!(CodedIndexKind::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexKind::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexKind::HasCustomDebugInformation.tag_bits(), 5);
    }

    #[test]
    fn encode_packs_tag_and_row() {
        // TypeRef has tag 1 in TypeDefOrRef, rows shift past the 2 tag bits
        assert_eq!(CodedIndexKind::TypeDefOrRef.encode(TableId::TypeRef, 3), 0x0D);
        // null reference
        assert_eq!(CodedIndexKind::TypeDefOrRef.encode(TableId::TypeDef, 0), 0);
    }

    #[test]
    #[should_panic(expected = "is not a candidate")]
    fn encode_rejects_foreign_table() {
        let _ = CodedIndexKind::HasSemantics.encode(TableId::Module, 1);
    }
}
