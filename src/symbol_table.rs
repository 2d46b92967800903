use fnv::FnvHashMap;

use crate::vm_writer::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    /// VM segment that variables of this kind live in.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }

    fn is_class_scoped(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub declared_type: String,
    pub kind: Kind,
    pub index: u16,
}

/// Class-scoped names (statics and fields) live for a whole class, while
/// subroutine-scoped names (arguments and locals) are dropped by
/// `start_subroutine`. Lookups try the subroutine tier first, so a local
/// shadows a field of the same name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: FnvHashMap<String, Symbol>,
    subroutine_scope: FnvHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defining a name twice in one tier overwrites the earlier entry.
    pub fn define(&mut self, name: &str, declared_type: &str, kind: Kind) {
        let symbol = Symbol {
            declared_type: declared_type.to_string(),
            kind,
            index: self.var_count(kind),
        };
        self.tier_mut(kind).insert(name.to_string(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.get(name).map(|symbol| symbol.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|symbol| symbol.declared_type.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.get(name).map(|symbol| symbol.index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn var_count(&self, kind: Kind) -> u16 {
        self.tier(kind)
            .values()
            .filter(|symbol| symbol.kind == kind)
            .count() as u16
    }

    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
    }

    fn tier(&self, kind: Kind) -> &FnvHashMap<String, Symbol> {
        if kind.is_class_scoped() {
            &self.class_scope
        } else {
            &self.subroutine_scope
        }
    }

    fn tier_mut(&mut self, kind: Kind) -> &mut FnvHashMap<String, Symbol> {
        if kind.is_class_scoped() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_resolve() {
        let mut table = SymbolTable::new();
        table.define("foo", "int", Kind::Static);
        assert_eq!(table.kind_of("foo"), Some(Kind::Static));
        assert_eq!(table.type_of("foo"), Some("int"));
        assert_eq!(table.index_of("foo"), Some(0));
        assert!(table.contains("foo"));
        assert!(!table.contains("bar"));
        assert_eq!(table.kind_of("bar"), None);
    }

    #[test]
    fn ordinals_count_per_kind() {
        let mut table = SymbolTable::new();
        table.define("foo", "int", Kind::Static);
        table.define("bar", "boolean", Kind::Field);
        table.define("baz", "char", Kind::Static);
        table.define("too", "boolean", Kind::Field);
        table.define("tar", "int", Kind::Static);

        assert_eq!(table.index_of("too"), Some(1));
        assert_eq!(table.index_of("tar"), Some(2));
        assert_eq!(table.var_count(Kind::Static), 3);
        assert_eq!(table.var_count(Kind::Field), 2);
    }

    #[test]
    fn declaration_list_gets_consecutive_ordinals() {
        let mut table = SymbolTable::new();
        table.define("a", "int", Kind::Local);
        let before = table.var_count(Kind::Local);
        for name in &["x", "y", "z"] {
            table.define(name, "Point", Kind::Local);
        }
        assert_eq!(table.var_count(Kind::Local), before + 3);
        assert_eq!(table.index_of("x"), Some(before));
        assert_eq!(table.index_of("y"), Some(before + 1));
        assert_eq!(table.index_of("z"), Some(before + 2));
    }

    #[test]
    fn start_subroutine_keeps_class_tier() {
        let mut table = SymbolTable::new();
        table.define("too", "boolean", Kind::Argument);
        table.define("foo", "int", Kind::Static);
        table.define("bar", "boolean", Kind::Field);
        table.define("tar", "int", Kind::Local);

        table.start_subroutine();
        table.start_subroutine();

        assert_eq!(table.var_count(Kind::Argument), 0);
        assert_eq!(table.var_count(Kind::Local), 0);
        assert_eq!(table.var_count(Kind::Static), 1);
        assert_eq!(table.var_count(Kind::Field), 1);
        assert!(!table.contains("too"));
        assert!(table.contains("bar"));
    }

    #[test]
    fn subroutine_names_shadow_class_names() {
        let mut table = SymbolTable::new();
        table.define("x", "int", Kind::Field);
        table.define("x", "Point", Kind::Argument);
        assert_eq!(table.kind_of("x"), Some(Kind::Argument));
        assert_eq!(table.type_of("x"), Some("Point"));

        table.start_subroutine();
        assert_eq!(table.kind_of("x"), Some(Kind::Field));
    }

    #[test]
    fn redefinition_overwrites() {
        let mut table = SymbolTable::new();
        table.define("x", "int", Kind::Local);
        table.define("x", "char", Kind::Local);
        assert_eq!(table.type_of("x"), Some("char"));
        assert_eq!(table.var_count(Kind::Local), 1);
    }

    #[test]
    fn kinds_map_to_segments() {
        assert_eq!(Kind::Local.segment(), Segment::Local);
        assert_eq!(Kind::Field.segment(), Segment::This);
        assert_eq!(Kind::Argument.segment(), Segment::Argument);
        assert_eq!(Kind::Static.segment(), Segment::Static);
    }
}
