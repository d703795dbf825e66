use std::ops::{Index, IndexMut};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::types::{ClassType, Identifier, TypeDenoter};

/// Handle to a declaration in the [`Declarations`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_private: bool,
    pub is_static: bool,
}

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers {
        is_private: false,
        is_static: false,
    };
    pub const PRIVATE: Modifiers = Modifiers {
        is_private: true,
        is_static: false,
    };
    pub const STATIC: Modifiers = Modifiers {
        is_private: false,
        is_static: true,
    };
    pub const PRIVATE_STATIC: Modifiers = Modifiers {
        is_private: true,
        is_static: true,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Class {
        fields: Vec<DeclId>,
        methods: Vec<DeclId>,
    },
    /// `owner` is `None` only for the array `length` pseudo-field.
    Field {
        modifiers: Modifiers,
        owner: Option<DeclId>,
    },
    Method {
        modifiers: Modifiers,
        owner: DeclId,
        params: Vec<DeclId>,
    },
    Parameter,
    LocalVar,
}

/// Where a declaration lives at run time. Assigned once by the code
/// generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeLocation {
    /// Index into the global static segment (`SB`-relative).
    Static(i32),
    /// Index into an object, past the object header (`OB`-relative).
    Instance(i32),
    /// Frame-relative slot (`LB`-relative); negative for parameters.
    Frame(i32),
    /// Entry address of a method in the code segment (`CB`-relative).
    Code(usize),
    /// Words allocated for an instance of a class, header included.
    ClassSize(i32),
}

impl RuntimeLocation {
    pub fn offset(&self) -> i32 {
        match self {
            RuntimeLocation::Static(offset)
            | RuntimeLocation::Instance(offset)
            | RuntimeLocation::Frame(offset)
            | RuntimeLocation::ClassSize(offset) => *offset,
            RuntimeLocation::Code(address) => *address as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub ty: TypeDenoter,
    pub kind: DeclKind,
    pub position: Position,
    location: Option<RuntimeLocation>,
}

impl Declaration {
    pub fn new(name: &str, ty: TypeDenoter, kind: DeclKind, position: Position) -> Self {
        Declaration {
            name: name.to_string(),
            ty,
            kind,
            position,
            location: None,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class { .. })
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, DeclKind::Field { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, DeclKind::Method { .. })
    }

    /// Fields and methods only.
    pub fn modifiers(&self) -> Option<Modifiers> {
        match &self.kind {
            DeclKind::Field { modifiers, .. } | DeclKind::Method { modifiers, .. } => {
                Some(*modifiers)
            }
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().is_some_and(|modifiers| modifiers.is_static)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers().is_some_and(|modifiers| modifiers.is_private)
    }

    pub fn owner(&self) -> Option<DeclId> {
        match &self.kind {
            DeclKind::Field { owner, .. } => *owner,
            DeclKind::Method { owner, .. } => Some(*owner),
            _ => None,
        }
    }

    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Method { params, .. } => params,
            _ => &[],
        }
    }

    pub fn location(&self) -> Option<RuntimeLocation> {
        self.location
    }
}

/// Arena owning every declaration of a program. Use sites refer to entries by
/// [`DeclId`].
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    entries: Vec<Declaration>,
}

impl Declarations {
    pub fn alloc(&mut self, declaration: Declaration) -> DeclId {
        self.entries.push(declaration);
        DeclId((self.entries.len() - 1) as u32)
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.entries.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, declaration)| (DeclId(index as u32), declaration))
    }

    pub fn set_location(&mut self, id: DeclId, location: RuntimeLocation) -> Result<(), Error> {
        let declaration = &mut self.entries[id.index()];
        if declaration.location.is_some() {
            return Err(Error::new(
                ErrorImpl::LocationAlreadyAssigned {
                    name: declaration.name.clone(),
                },
                declaration.position,
            ));
        }
        declaration.location = Some(location);
        Ok(())
    }

    pub fn location(&self, id: DeclId) -> Result<RuntimeLocation, Error> {
        let declaration = &self[id];
        declaration.location.ok_or_else(|| {
            Error::new(
                ErrorImpl::UnassignedLocation {
                    name: declaration.name.clone(),
                },
                declaration.position,
            )
        })
    }
}

impl Index<DeclId> for Declarations {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Self::Output {
        &self.entries[id.index()]
    }
}

impl IndexMut<DeclId> for Declarations {
    fn index_mut(&mut self, id: DeclId) -> &mut Self::Output {
        &mut self.entries[id.index()]
    }
}

/// The environment every program is compiled against:
///
/// ```text
/// class String { }
/// class _PrintStream { public void println(int n) { } }
/// class System { public static _PrintStream out; }
/// ```
///
/// plus the read-only `int length` pseudo-field of arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predefined {
    pub string: DeclId,
    pub print_stream: DeclId,
    pub println: DeclId,
    pub system: DeclId,
    pub out: DeclId,
    pub array_length: DeclId,
}

impl Predefined {
    pub fn install(decls: &mut Declarations) -> Self {
        let null = Position::null();

        let string = decls.alloc(Declaration::new(
            "String",
            TypeDenoter::unsupported(),
            DeclKind::Class {
                fields: vec![],
                methods: vec![],
            },
            null,
        ));

        let print_stream = decls.alloc(Declaration::new(
            "_PrintStream",
            TypeDenoter::unsupported(),
            DeclKind::Class {
                fields: vec![],
                methods: vec![],
            },
            null,
        ));
        decls[print_stream].ty = class_type_of("_PrintStream", print_stream);

        let n = decls.alloc(Declaration::new(
            "n",
            TypeDenoter::int(),
            DeclKind::Parameter,
            null,
        ));
        let println = decls.alloc(Declaration::new(
            "println",
            TypeDenoter::void(),
            DeclKind::Method {
                modifiers: Modifiers::PUBLIC,
                owner: print_stream,
                params: vec![n],
            },
            null,
        ));
        if let DeclKind::Class { methods, .. } = &mut decls[print_stream].kind {
            methods.push(println);
        }

        let system = decls.alloc(Declaration::new(
            "System",
            TypeDenoter::unsupported(),
            DeclKind::Class {
                fields: vec![],
                methods: vec![],
            },
            null,
        ));
        decls[system].ty = class_type_of("System", system);

        let out = decls.alloc(Declaration::new(
            "out",
            class_type_of("_PrintStream", print_stream),
            DeclKind::Field {
                modifiers: Modifiers::STATIC,
                owner: Some(system),
            },
            null,
        ));
        if let DeclKind::Class { fields, .. } = &mut decls[system].kind {
            fields.push(out);
        }

        let array_length = decls.alloc(Declaration::new(
            "length",
            TypeDenoter::int(),
            DeclKind::Field {
                modifiers: Modifiers::PUBLIC,
                owner: None,
            },
            null,
        ));

        Predefined {
            string,
            print_stream,
            println,
            system,
            out,
            array_length,
        }
    }

    pub fn classes(&self) -> [DeclId; 3] {
        [self.string, self.print_stream, self.system]
    }
}

/// The type of values of the class declared as `id`.
pub fn class_type_of(name: &str, id: DeclId) -> TypeDenoter {
    TypeDenoter::Class(ClassType {
        name: Identifier::resolved(name, id),
    })
}
