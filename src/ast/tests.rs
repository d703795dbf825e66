//! Unit tests for the program tree.
//!
//! Covers the predefined environment, the construction API and the
//! write-once annotation slots.

use crate::ast::{
    ast::Program,
    declarations::{DeclKind, Modifiers, RuntimeLocation},
    expressions::{Expr, ExprKind, Reference},
    types::{Identifier, TypeDenoter, TypeKind},
};
use crate::errors::errors::ErrorImpl;
use crate::Position;

#[test]
fn test_predefined_environment() {
    let program = Program::new();
    let predefined = program.predefined;

    assert_eq!(program.decls[predefined.string].name, "String");
    assert!(program.decls[predefined.string]
        .ty
        .is_kind(TypeKind::Unsupported));

    let out = &program.decls[predefined.out];
    assert!(out.is_static());
    assert_eq!(out.owner(), Some(predefined.system));
    assert_eq!(out.ty.to_string(), "_PrintStream");

    let println = &program.decls[predefined.println];
    assert!(println.is_method());
    assert!(println.ty.is_void());
    assert_eq!(println.params().len(), 1);

    let length = &program.decls[predefined.array_length];
    assert!(length.is_field());
    assert_eq!(length.owner(), None);
    assert!(program.classes.is_empty());
}

#[test]
fn test_class_builder() {
    let mut program = Program::new();
    let class = program
        .class("Counter")
        .at(1, 1)
        .field("count", TypeDenoter::int(), Modifiers::PRIVATE)
        .at(2, 5)
        .method(
            "bump",
            TypeDenoter::void(),
            Modifiers::PUBLIC,
            vec![("by", TypeDenoter::int())],
            vec![],
        )
        .id();

    assert_eq!(program.find_class("Counter"), Some(class));
    assert_eq!(program.decls[class].position, Position::new(1, 1));

    let count = program.find_member(class, "count").unwrap();
    assert!(program.decls[count].is_private());
    assert_eq!(program.decls[count].position, Position::new(2, 5));

    let bump = program.find_member(class, "bump").unwrap();
    assert!(matches!(program.decls[bump].kind, DeclKind::Method { .. }));
    assert_eq!(program.decls[bump].owner(), Some(class));
    assert!(program.method(bump).is_some());
    assert_eq!(program.classes[0].methods.len(), 1);
}

#[test]
fn test_qualified_reference_helpers() {
    let reference = Reference::id("System").member("out").member("println").at(3, 9);

    assert_eq!(reference.name(), "println");
    assert_eq!(reference.position(), Position::new(3, 9));
    assert!(reference.decl().is_none());

    let Reference::Qualified { base, .. } = &reference else {
        panic!("expected a qualified reference");
    };
    assert_eq!(base.name(), "out");
}

#[test]
fn test_expression_positions_follow_references() {
    let call = Expr::call(Reference::id("f").at(4, 2), vec![Expr::int(1)]);
    assert_eq!(call.position, Position::new(4, 2));
    assert!(matches!(call.kind, ExprKind::Call { .. }));
    assert!(call.ty.is_none());
}

#[test]
fn test_identifier_bind_is_write_once() {
    let mut program = Program::new();
    let first = program.local("a", TypeDenoter::int());
    let second = program.local("b", TypeDenoter::int());

    let mut identifier = Identifier::new("a");
    assert_eq!(identifier.bind(first), first);
    assert_eq!(identifier.bind(second), first);
    assert_eq!(identifier.decl, Some(first));
}

#[test]
fn test_runtime_location_is_write_once() {
    let mut program = Program::new();
    let local = program.local("x", TypeDenoter::int());

    let error = program.decls.location(local).unwrap_err();
    assert!(matches!(error.get_kind(), ErrorImpl::UnassignedLocation { .. }));

    program
        .decls
        .set_location(local, RuntimeLocation::Frame(3))
        .unwrap();
    assert_eq!(program.decls.location(local), Ok(RuntimeLocation::Frame(3)));

    let error = program
        .decls
        .set_location(local, RuntimeLocation::Frame(4))
        .unwrap_err();
    assert!(matches!(
        error.get_kind(),
        ErrorImpl::LocationAlreadyAssigned { .. }
    ));
}

#[test]
fn test_type_display() {
    assert_eq!(TypeDenoter::int().to_string(), "int");
    assert_eq!(
        TypeDenoter::array(TypeDenoter::class("A")).to_string(),
        "A[]"
    );
    assert_eq!(
        TypeDenoter::array(TypeDenoter::boolean()).to_string(),
        "boolean[]"
    );
}
