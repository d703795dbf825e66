use crate::ast::{
    declarations::Declarations,
    types::{TypeDenoter, TypeKind},
};

/// Structural type compatibility.
///
/// `error` is compatible with everything and `unsupported` with nothing.
/// `null` is compatible with every array and class type. Arrays match when
/// their element types do; classes match when both names resolved to the
/// same class and that class is not an unsupported one such as `String`.
pub fn types_equal(decls: &Declarations, a: &TypeDenoter, b: &TypeDenoter) -> bool {
    if a.is_error() || b.is_error() {
        return true;
    }
    if a.is_kind(TypeKind::Unsupported) || b.is_kind(TypeKind::Unsupported) {
        return false;
    }

    match (a, b) {
        (TypeDenoter::Array(_), other) | (other, TypeDenoter::Array(_))
            if other.is_kind(TypeKind::Null) =>
        {
            true
        }
        (TypeDenoter::Array(left), TypeDenoter::Array(right)) => types_equal(decls, left, right),
        (TypeDenoter::Array(_), _) | (_, TypeDenoter::Array(_)) => false,

        (TypeDenoter::Class(_), other) | (other, TypeDenoter::Class(_))
            if other.is_kind(TypeKind::Null) =>
        {
            true
        }
        (TypeDenoter::Class(left), TypeDenoter::Class(right)) => {
            match (left.name.decl, right.name.decl) {
                (Some(left), Some(right)) => {
                    left == right && !decls[left].ty.is_kind(TypeKind::Unsupported)
                }
                _ => false,
            }
        }
        (TypeDenoter::Class(_), _) | (_, TypeDenoter::Class(_)) => false,

        (TypeDenoter::Base(left), TypeDenoter::Base(right)) => left == right,
    }
}
