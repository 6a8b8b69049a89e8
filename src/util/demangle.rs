//! Symbol name simplification.
//!
//! Resolved names are often long and noisy: rustc appends a hash to every
//! legacy-mangled path and C++ standard library types expand to their full
//! template spelling. Call stacks are far easier to read with that removed.

/// Verbose spellings and their short replacements, applied in order.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("std::__cxx11::", "std::"),
    ("std::__1::", "std::"),
    (
        "std::basic_string<char, std::char_traits<char>, std::allocator<char> >",
        "std::string",
    ),
    (
        "std::basic_string<wchar_t, std::char_traits<wchar_t>, std::allocator<wchar_t> >",
        "std::wstring",
    ),
    ("alloc::string::String", "String"),
    ("alloc::vec::Vec", "Vec"),
    ("alloc::boxed::Box", "Box"),
    ("alloc::sync::Arc", "Arc"),
    ("alloc::rc::Rc", "Rc"),
    ("core::option::Option", "Option"),
    ("core::result::Result", "Result"),
];

/// Simplify a resolved symbol name for display.
pub fn simplify_name(name: &str) -> String {
    let mut out = strip_rust_hash(name).to_string();

    for (long, short) in REPLACEMENTS {
        if out.contains(long) {
            out = out.replace(long, short);
        }
    }

    strip_allocator_args(&mut out);
    out
}

/// Remove a trailing `::h0123456789abcdef` legacy mangling hash.
fn strip_rust_hash(name: &str) -> &str {
    if let Some(pos) = name.rfind("::h") {
        let hash = &name[pos + 3..];
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return &name[..pos];
        }
    }
    name
}

/// Drop defaulted `std::allocator<...>` template arguments.
fn strip_allocator_args(s: &mut String) {
    const NEEDLE: &str = ", std::allocator<";

    while let Some(start) = s.find(NEEDLE) {
        // find the '>' closing this allocator argument
        let mut depth = 0usize;
        let mut end = None;
        for (i, c) in s[start + NEEDLE.len()..].char_indices() {
            match c {
                '<' => depth += 1,
                '>' if depth == 0 => {
                    end = Some(start + NEEDLE.len() + i + 1);
                    break;
                }
                '>' => depth -= 1,
                _ => {}
            }
        }
        match end {
            Some(end) => s.replace_range(start..end, ""),
            None => break,
        }
    }

    // "vector<int >" leftovers from the closing bracket spacing
    while let Some(pos) = s.find(" >") {
        s.replace_range(pos..pos + 1, "");
    }
}
