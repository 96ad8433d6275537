//! Debug printing of record values
//!
//! Unlike the codec, the printer accepts every kind: opaque nodes are shown
//! with whatever the traversal hands over (length, presence).

use crate::path::FieldPath;
use crate::reflect::{Kind, Reflect, TypeInfo};
use crate::scalar::Scalar;
use crate::visitor::ValueVisitor;
use crate::Result;
use std::fmt::Write as _;

#[derive(Default)]
struct TreePrinter {
    out: String,
}

impl TreePrinter {
    fn line(&mut self, kind: Kind, path: &FieldPath, value: &dyn std::fmt::Display) {
        let indent = "  ".repeat(path.depth());
        let name = path.name().unwrap_or("<root>");
        let _ = writeln!(self.out, "{indent}{name}: {kind} = {value}");
        log::trace!("{path}: {kind} = {value}");
    }

    fn opaque(&mut self, info: &TypeInfo, path: &FieldPath, detail: &str) {
        let value = format!("{} {}", info.name(), detail);
        self.line(info.kind(), path, &value.trim_end());
    }
}

impl ValueVisitor for TreePrinter {
    fn visit_bool(&mut self, value: bool, path: &FieldPath) -> Result<()> {
        self.line(Kind::Bool, path, &value);
        Ok(())
    }

    fn visit_int(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        self.line(Kind::Int, path, &value);
        Ok(())
    }

    fn visit_uint(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        self.line(Kind::Uint, path, &value);
        Ok(())
    }

    fn visit_float(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        self.line(Kind::Float, path, &value);
        Ok(())
    }

    fn visit_complex(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        self.line(Kind::Complex, path, &value);
        Ok(())
    }

    fn visit_string(&mut self, value: &str, path: &FieldPath) -> Result<()> {
        self.line(Kind::String, path, &format!("{value:?}"));
        Ok(())
    }

    fn visit_array(&mut self, info: &TypeInfo, len: usize, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, &format!("[{len}]"));
        Ok(())
    }

    fn visit_chan(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, "");
        Ok(())
    }

    fn visit_func(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, "");
        Ok(())
    }

    fn visit_interface(&mut self, info: &TypeInfo, present: bool, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, if present { "" } else { "(empty)" });
        Ok(())
    }

    fn visit_map(&mut self, info: &TypeInfo, len: usize, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, &format!("{{{len} entries}}"));
        Ok(())
    }

    fn visit_pointer(&mut self, _info: &TypeInfo, present: bool, path: &FieldPath) -> Result<()> {
        self.line(Kind::Pointer, path, &if present { "Some" } else { "None" });
        Ok(())
    }

    fn visit_slice(
        &mut self,
        info: &TypeInfo,
        len: usize,
        bytes: Option<&[u8]>,
        path: &FieldPath,
    ) -> Result<()> {
        match bytes {
            Some(bytes) => self.line(Kind::Slice, path, &format!("{bytes:?}")),
            None => self.opaque(info, path, &format!("[{len}]")),
        }
        Ok(())
    }

    fn visit_struct(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.line(Kind::Struct, path, &info.name());
        Ok(())
    }

    fn visit_unsafe_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.opaque(info, path, "");
        Ok(())
    }
}

/// One indented line per visited node: `name: kind = value`
pub fn debug_tree<T: Reflect + ?Sized>(value: &T) -> Result<String> {
    let mut printer = TreePrinter::default();
    value.traverse(&mut printer, &FieldPath::root())?;
    Ok(printer.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fuzz_record, Dynamic};
    use std::collections::HashMap;

    fuzz_record! {
        struct Leaf {
            pub on: bool,
        }
    }

    fuzz_record! {
        struct Tree {
            pub name: String,
            pub leaf: Option<Leaf>,
            pub table: HashMap<u8, u8>,
            pub any: Dynamic,
            pub raw: Vec<u8>,
            hidden: u64,
        }
    }

    #[test]
    fn test_tree_layout() {
        let tree = Tree {
            name: "oak".into(),
            leaf: Some(Leaf { on: true }),
            table: HashMap::new(),
            any: Dynamic::empty(),
            raw: vec![1, 2],
            hidden: 99,
        };

        let out = debug_tree(&tree).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "<root>: struct = Tree");
        assert_eq!(lines[1], "  name: string = \"oak\"");
        assert_eq!(lines[2], "  leaf: pointer = Some");
        assert_eq!(lines[3], "    *: struct = Leaf");
        assert_eq!(lines[4], "      on: bool = true");
        assert!(lines[5].starts_with("  table: map = "));
        assert!(lines[5].ends_with("{0 entries}"));
        assert_eq!(lines[6], "  any: interface = Dynamic (empty)");
        assert_eq!(lines[7], "  raw: slice = [1, 2]");
        assert_eq!(lines.len(), 8);
        assert!(!out.contains("hidden"));
    }
}
