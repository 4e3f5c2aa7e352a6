use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Immutable UTF-16 string, interned by content. Equal contents share one
/// allocation, so equality is usually a pointer comparison and the cached
/// hash doubles as the property-map hash.
#[derive(Clone)]
pub struct JSString {
    data: Rc<JSStringData>,
}

pub struct JSStringData {
    units: Vec<u16>,
    hash: u32,
}

thread_local! {
    static INTERN_TABLE: RefCell<HashMap<Vec<u16>, Weak<JSStringData>>> = RefCell::new(HashMap::new());
}

/// 32-bit rolling hash: `h = (h << 6) + h + c`.
fn hash_units(units: &[u16]) -> u32 {
    let mut h: u32 = 0;
    for &c in units {
        h = (h << 6).wrapping_add(h).wrapping_add(c as u32);
    }
    h
}

impl JSString {
    pub fn intern(s: &str) -> JSString {
        JSString::from_units(s.encode_utf16().collect())
    }

    pub fn from_units(units: Vec<u16>) -> JSString {
        INTERN_TABLE.with(|table| {
            let mut table = table.borrow_mut();
            if let Some(weak) = table.get(&units)
                && let Some(data) = weak.upgrade()
            {
                return JSString { data };
            }
            let data = Rc::new(JSStringData {
                hash: hash_units(&units),
                units: units.clone(),
            });
            table.insert(units, Rc::downgrade(&data));
            JSString { data }
        })
    }

    pub fn empty() -> JSString {
        JSString::intern("")
    }

    pub fn len(&self) -> usize {
        self.data.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.units.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.data.hash
    }

    pub fn units(&self) -> &[u16] {
        &self.data.units
    }

    pub fn char_at(&self, index: usize) -> Option<u16> {
        self.data.units.get(index).copied()
    }

    pub fn concat(&self, other: &JSString) -> JSString {
        let mut units = Vec::with_capacity(self.len() + other.len());
        units.extend_from_slice(self.units());
        units.extend_from_slice(other.units());
        JSString::from_units(units)
    }

    /// Substring over code units; `start`/`end` are clamped by the caller.
    pub fn substring(&self, start: usize, end: usize) -> JSString {
        JSString::from_units(self.data.units[start..end].to_vec())
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.data.units)
    }

    pub fn ptr_eq(&self, other: &JSString) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for JSString {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.data.hash == other.data.hash && self.data.units == other.data.units)
    }
}

impl Eq for JSString {}

impl PartialOrd for JSString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JSString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data.units.cmp(&other.data.units)
    }
}

impl std::hash::Hash for JSString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.data.hash);
    }
}

impl std::fmt::Display for JSString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

impl std::fmt::Debug for JSString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_rust_string())
    }
}

impl From<&str> for JSString {
    fn from(s: &str) -> Self {
        JSString::intern(s)
    }
}

impl From<String> for JSString {
    fn from(s: String) -> Self {
        JSString::intern(&s)
    }
}

/// Pre-intern the names the object model touches on every lookup.
pub fn seed_atoms() {
    for atom in [
        "", "length", "prototype", "constructor", "toString", "valueOf", "message", "name", "arguments", "this", "value", "get", "set",
        "writable", "enumerable", "configurable", "index", "input", "source", "global", "ignoreCase", "multiline", "lastIndex",
        "undefined", "null", "true", "false",
    ] {
        let _ = JSString::intern(atom);
    }
}

/// Number of live entries in the intern table.
pub fn intern_live_count() -> usize {
    INTERN_TABLE.with(|table| table.borrow().values().filter(|w| w.strong_count() > 0).count())
}

/// Bytes held by dead intern-table entries, reclaimable by [`prune_interned`].
pub fn intern_dead_bytes() -> usize {
    INTERN_TABLE.with(|table| {
        table
            .borrow()
            .iter()
            .filter(|(_, w)| w.strong_count() == 0)
            .map(|(k, _)| k.len() * 2 + std::mem::size_of::<JSStringData>())
            .sum()
    })
}

/// Drop intern-table entries whose strings have died. Returns how many
/// entries were removed.
pub fn prune_interned() -> usize {
    INTERN_TABLE.with(|table| {
        let mut table = table.borrow_mut();
        let before = table.len();
        table.retain(|_, w| w.strong_count() > 0);
        before - table.len()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_hash_matches_definition() {
        let s = JSString::intern("ab");
        // h("a") = 0*65 + 97 = 97; h("ab") = 97*65 + 98 = 6403
        assert_eq!(s.hash(), 97 * 65 + 98);
        assert_eq!(JSString::intern("").hash(), 0);
    }

    #[test]
    fn interning_shares_storage() {
        let a = JSString::intern("hello");
        let b = JSString::from_units("hello".encode_utf16().collect());
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn concat_and_compare() {
        let a = JSString::intern("foo");
        let b = JSString::intern("bar");
        assert_eq!(a.concat(&b).to_rust_string(), "foobar");
        assert!(JSString::intern("abc") < JSString::intern("abd"));
        assert!(JSString::intern("ab") < JSString::intern("abc"));
    }

    #[test]
    fn pruning_drops_dead_entries() {
        {
            let _tmp = JSString::intern("only-lives-in-this-test-scope");
        }
        assert!(prune_interned() >= 1);
    }
}
