//==================================================
// File: bindings/abi.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Native plugin descriptor contract for Revel attachments
// Objective: Define the fixed C-compatible introspection surface a plugin
//            library must export so the host never walks raw metadata
//==================================================

use std::ffi::CStr;
use std::os::raw::c_char;

/// Symbol name every attachable library must export.
///
/// The export has the signature
/// `extern "C" fn() -> *const PluginDescriptor` and must return a pointer
/// that stays valid for as long as the library remains loaded.
pub const DESCRIPTOR_ENTRY_POINT: &[u8] = b"revel_plugin_descriptor";

/// A single callable exposed by a plugin library.
///
/// `invoke` receives a NUL-terminated UTF-8 JSON array of arguments and
/// returns a NUL-terminated UTF-8 JSON value allocated by the plugin, or a
/// null pointer when the call fails. The host copies the result and then
/// hands the pointer back through [`PluginDescriptor::release`].
#[repr(C)]
pub struct PluginSymbol {
    pub name: *const c_char,
    pub invoke: Option<unsafe extern "C" fn(*const c_char) -> *mut c_char>,
}

/// Top-level descriptor returned by [`DESCRIPTOR_ENTRY_POINT`].
///
/// `identity` is the library's self-reported qualified descriptor, for
/// example `"geo.tools, 1.4.0, stable"`. The text before the first comma is
/// the library's declared name and is used when the caller does not supply
/// an explicit namespace.
#[repr(C)]
pub struct PluginDescriptor {
    pub identity: *const c_char,
    pub symbol_count: usize,
    pub symbols: *const PluginSymbol,
    pub release: Option<unsafe extern "C" fn(*mut c_char)>,
}

/// One harvested symbol, ready to be wired into a namespace object.
#[derive(Clone, Copy, Debug)]
pub struct NamedSymbol {
    pub invoke: unsafe extern "C" fn(*const c_char) -> *mut c_char,
    pub release: Option<unsafe extern "C" fn(*mut c_char)>,
}

/// Everything the host needs from a successfully enumerated descriptor.
#[derive(Debug)]
pub struct HarvestedPlugin {
    pub identity: String,
    pub symbols: Vec<(String, NamedSymbol)>,
}

/// Derive the exposed namespace name from a library's declared identity:
/// the text before the first separator of its qualified descriptor.
pub fn derive_namespace(identity: &str) -> String {
    identity
        .split(',')
        .next()
        .unwrap_or(identity)
        .trim()
        .to_string()
}

/// Enumerate a descriptor's symbol table.
///
/// Every defective symbol produces its own diagnostic line; a descriptor
/// with any defective symbol fails as a whole so that no partially
/// populated namespace can ever be published.
///
/// # Safety
///
/// `descriptor` must point to a live [`PluginDescriptor`] whose `symbols`
/// array holds `symbol_count` entries and whose strings are NUL-terminated.
pub unsafe fn harvest(descriptor: &PluginDescriptor) -> Result<HarvestedPlugin, Vec<String>> {
    let mut diagnostics = Vec::new();

    if descriptor.identity.is_null() {
        diagnostics.push("descriptor has no identity string".to_string());
        return Err(diagnostics);
    }
    let identity = CStr::from_ptr(descriptor.identity)
        .to_string_lossy()
        .into_owned();

    let mut symbols = Vec::with_capacity(descriptor.symbol_count);
    if descriptor.symbol_count > 0 && descriptor.symbols.is_null() {
        diagnostics.push(format!("{identity}: symbol table missing"));
        return Err(diagnostics);
    }

    for index in 0..descriptor.symbol_count {
        let entry = &*descriptor.symbols.add(index);
        let name = if entry.name.is_null() {
            diagnostics.push(format!("{identity}: symbol {index} has no name"));
            continue;
        } else {
            CStr::from_ptr(entry.name).to_string_lossy().into_owned()
        };
        match entry.invoke {
            Some(invoke) => symbols.push((
                name,
                NamedSymbol {
                    invoke,
                    release: descriptor.release,
                },
            )),
            None => diagnostics.push(format!("{identity}: symbol '{name}' has no entry point")),
        }
    }

    if diagnostics.is_empty() {
        Ok(HarvestedPlugin { identity, symbols })
    } else {
        Err(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    unsafe extern "C" fn echo(_args: *const c_char) -> *mut c_char {
        std::ptr::null_mut()
    }

    fn descriptor_with(
        identity: &CString,
        symbols: &[PluginSymbol],
    ) -> PluginDescriptor {
        PluginDescriptor {
            identity: identity.as_ptr(),
            symbol_count: symbols.len(),
            symbols: symbols.as_ptr(),
            release: None,
        }
    }

    #[test]
    fn derives_name_before_first_separator() {
        assert_eq!(derive_namespace("geo.tools, 1.4.0, stable"), "geo.tools");
        assert_eq!(derive_namespace("plain"), "plain");
        assert_eq!(derive_namespace("  padded , x"), "padded");
    }

    #[test]
    fn harvests_all_well_formed_symbols() {
        let identity = CString::new("geo.tools, 1.0").unwrap();
        let a = CString::new("distance").unwrap();
        let b = CString::new("bearing").unwrap();
        let symbols = [
            PluginSymbol {
                name: a.as_ptr(),
                invoke: Some(echo),
            },
            PluginSymbol {
                name: b.as_ptr(),
                invoke: Some(echo),
            },
        ];
        let descriptor = descriptor_with(&identity, &symbols);
        let harvested = unsafe { harvest(&descriptor) }.expect("harvest succeeds");
        assert_eq!(harvested.identity, "geo.tools, 1.0");
        let names: Vec<_> = harvested.symbols.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["distance", "bearing"]);
    }

    #[test]
    fn one_bad_symbol_fails_the_whole_descriptor() {
        let identity = CString::new("geo.tools, 1.0").unwrap();
        let good = CString::new("distance").unwrap();
        let bad = CString::new("broken").unwrap();
        let symbols = [
            PluginSymbol {
                name: good.as_ptr(),
                invoke: Some(echo),
            },
            PluginSymbol {
                name: bad.as_ptr(),
                invoke: None,
            },
        ];
        let descriptor = descriptor_with(&identity, &symbols);
        let diagnostics = unsafe { harvest(&descriptor) }.expect_err("harvest fails");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("broken"));
    }

    #[test]
    fn every_bad_symbol_gets_its_own_diagnostic() {
        let identity = CString::new("geo.tools").unwrap();
        let named = CString::new("half").unwrap();
        let symbols = [
            PluginSymbol {
                name: std::ptr::null(),
                invoke: Some(echo),
            },
            PluginSymbol {
                name: named.as_ptr(),
                invoke: None,
            },
        ];
        let descriptor = descriptor_with(&identity, &symbols);
        let diagnostics = unsafe { harvest(&descriptor) }.expect_err("harvest fails");
        assert_eq!(diagnostics.len(), 2);
    }
}
