use crate::runtime::ImportTable;
use std::collections::BTreeMap;

/// Address-to-name lookup built once from debug labels and the engine's
/// symbol table.
#[derive(Debug, Clone, Default)]
pub struct LabelResolver {
    labels: BTreeMap<u32, String>,
}

impl LabelResolver {
    /// Merge caller-supplied labels with the engine's symbol table. Engine
    /// symbols win on colliding addresses.
    pub fn new(labels: impl IntoIterator<Item = (u32, String)>, imports: ImportTable) -> Self {
        let mut merged: BTreeMap<u32, String> = labels.into_iter().collect();
        merged.extend(imports);
        Self { labels: merged }
    }

    /// Name bound to exactly `addr`.
    pub fn label(&self, addr: u32) -> Option<&str> {
        self.labels.get(&addr).map(String::as_str)
    }

    /// Resolve a label name, falling back to a bare hex address.
    ///
    /// Names match exactly and case-sensitively, lowest address first. The
    /// hex fallback accepts only `[0-9a-fA-F]+` (no `0x` prefix).
    pub fn resolve_name(&self, name: &str) -> Option<u32> {
        self.labels
            .iter()
            .find(|(_, label)| label.as_str() == name)
            .map(|(&addr, _)| addr)
            .or_else(|| parse_hex(name))
    }

    /// Render `addr` relative to the nearest label at or below it, e.g.
    /// `main+0x1a`, or as bare hex when nothing precedes it.
    pub fn describe(&self, addr: u32) -> String {
        match self.labels.range(..=addr).next_back() {
            Some((&base, name)) if base == addr => name.clone(),
            Some((&base, name)) => format!("{}+{:#x}", name, addr - base),
            None => format!("{:08x}", addr),
        }
    }

    /// Labels in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels.iter().map(|(&a, n)| (a, n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn parse_hex(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}
