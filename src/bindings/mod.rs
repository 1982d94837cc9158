//==================================================
// File: bindings/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host binding registry exposing native libraries to scripts
// Objective: Load plugin libraries through the descriptor contract and
//            publish their symbols as namespace objects, isolating every
//            failure to the attachment call that caused it
//==================================================

pub mod abi;

use std::collections::HashMap;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::{CStr, CString};
use std::path::{Path, PathBuf};

use libloading::Library;
use rhai::{Dynamic, EvalAltResult, FnPtr, Map};

use self::abi::{HarvestedPlugin, NamedSymbol, PluginDescriptor, DESCRIPTOR_ENTRY_POINT};

/// Map key that marks a published namespace object. Symbol invocations use
/// it to recognize (and skip) the bound receiver in method-style calls.
const NAMESPACE_MARKER: &str = "__name";

//==================================================
// Section 1.0 - Attachment Outcomes
//==================================================

/// Tagged result of one attachment call. Failures never unwind across the
/// script boundary; they are reported and collapsed to `false`.
#[derive(Debug)]
pub enum AttachOutcome {
    Attached { source: String, namespace: String },
    Failed { diagnostics: Vec<String> },
}

impl AttachOutcome {
    /// Emit the outcome on the error stream and collapse it to the boolean
    /// the script-visible operations return. Diagnostics deliberately avoid
    /// standard output so captured script output stays clean.
    pub fn report(self) -> bool {
        match self {
            AttachOutcome::Attached { source, namespace } => {
                eprintln!("Attached {source} as {namespace}");
                true
            }
            AttachOutcome::Failed { diagnostics } => {
                for line in diagnostics {
                    eprintln!("{line}");
                }
                false
            }
        }
    }
}

//==================================================
// Section 2.0 - Binding Registry
//==================================================

/// Registry of published namespaces and the libraries backing them.
///
/// Loaded libraries are retained for the lifetime of the registry so the
/// function pointers harvested from them stay valid. Re-attaching under an
/// existing namespace name silently replaces the previous binding.
// @ZNOTE[Bindings]: last-write-wins on duplicate names matches the shipped
// behavior; stricter semantics are pending product-owner confirmation.
pub struct BindingRegistry {
    namespaces: HashMap<String, Dynamic>,
    libraries: Vec<Library>,
    library_dir: PathBuf,
}

impl BindingRegistry {
    pub fn new(library_dir: PathBuf) -> Self {
        Self {
            namespaces: HashMap::new(),
            libraries: Vec::new(),
            library_dir,
        }
    }

    /// Look up a published namespace object by name. Used by the engine's
    /// variable resolver so attached namespaces are visible to the very
    /// next expression after `attach` returns.
    pub fn resolve(&self, name: &str) -> Option<Dynamic> {
        self.namespaces.get(name).cloned()
    }

    /// Names of all published namespaces, for diagnostics.
    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    /// `attach(path)` / `attach(path, name)`: load a library from a file
    /// path. An empty name derives the namespace from the library's
    /// declared identity.
    pub fn attach_path(&mut self, path: &str, explicit: Option<&str>) -> AttachOutcome {
        let file = PathBuf::from(path);
        self.load_and_publish(path, &file, explicit)
    }

    /// `attachNamed(path, name)`: resolve through the library's declared
    /// identity. The file at `path` supplies the identity; the library is
    /// then loaded from its installed location in the library directory.
    pub fn attach_declared(&mut self, path: &str, name: &str) -> AttachOutcome {
        let probe = PathBuf::from(path);
        let identity = match read_identity(&probe) {
            Ok(identity) => identity,
            Err(diagnostics) => return AttachOutcome::Failed { diagnostics },
        };
        let logical = abi::derive_namespace(&identity);
        let installed = self.library_dir.join(library_file_name(&logical));
        self.load_and_publish(path, &installed, Some(name))
    }

    /// `assembly(logicalName, internalName)`: resolve purely by logical
    /// name within the library directory; both names are explicit.
    pub fn attach_logical(&mut self, logical: &str, internal: &str) -> AttachOutcome {
        let installed = self.library_dir.join(library_file_name(logical));
        self.load_and_publish(logical, &installed, Some(internal))
    }

    /// Publish a fully built namespace object. Split out from the loading
    /// path so the overwrite semantics stay observable without a real
    /// library on disk.
    fn publish(&mut self, namespace: String, object: Map) {
        self.namespaces
            .insert(namespace, Dynamic::from_map(object));
    }

    fn load_and_publish(
        &mut self,
        source: &str,
        file: &Path,
        explicit: Option<&str>,
    ) -> AttachOutcome {
        if !file.exists() {
            return AttachOutcome::Failed {
                diagnostics: vec![format!("{} not found.", file.display())],
            };
        }

        let library = match unsafe { Library::new(file) } {
            Ok(library) => library,
            Err(error) => {
                return AttachOutcome::Failed {
                    diagnostics: vec![error.to_string()],
                }
            }
        };

        let harvested = match enumerate(&library, file) {
            Ok(harvested) => harvested,
            Err(diagnostics) => return AttachOutcome::Failed { diagnostics },
        };

        let namespace = match explicit {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => abi::derive_namespace(&harvested.identity),
        };

        let object = match build_namespace(&namespace, &harvested) {
            Ok(object) => object,
            Err(diagnostics) => return AttachOutcome::Failed { diagnostics },
        };

        tracing::debug!(source, namespace = %namespace, symbols = harvested.symbols.len(), "attachment published");
        self.publish(namespace.clone(), object);
        self.libraries.push(library);
        AttachOutcome::Attached {
            source: source.to_string(),
            namespace,
        }
    }
}

//==================================================
// Section 3.0 - Library Enumeration
//==================================================

/// Installed file name for a logical library name, platform prefix and
/// suffix included.
pub fn library_file_name(logical: &str) -> String {
    format!("{DLL_PREFIX}{logical}{DLL_SUFFIX}")
}

fn enumerate(library: &Library, file: &Path) -> Result<HarvestedPlugin, Vec<String>> {
    let entry = match unsafe {
        library.get::<unsafe extern "C" fn() -> *const PluginDescriptor>(DESCRIPTOR_ENTRY_POINT)
    } {
        Ok(entry) => entry,
        Err(error) => return Err(vec![format!("{}: {error}", file.display())]),
    };

    let descriptor = unsafe { entry() };
    if descriptor.is_null() {
        return Err(vec![format!(
            "{}: descriptor entry point returned null",
            file.display()
        )]);
    }

    unsafe { abi::harvest(&*descriptor) }
}

fn read_identity(file: &Path) -> Result<String, Vec<String>> {
    if !file.exists() {
        return Err(vec![format!("{} not found.", file.display())]);
    }
    let library = match unsafe { Library::new(file) } {
        Ok(library) => library,
        Err(error) => return Err(vec![error.to_string()]),
    };
    enumerate(&library, file).map(|harvested| harvested.identity)
}

//==================================================
// Section 4.0 - Namespace Construction
//==================================================

fn build_namespace(name: &str, plugin: &HarvestedPlugin) -> Result<Map, Vec<String>> {
    let mut object = Map::new();
    object.insert(NAMESPACE_MARKER.into(), name.into());
    for (symbol_name, symbol) in &plugin.symbols {
        let pointer = make_symbol_fn(symbol_name, *symbol)
            .map_err(|message| vec![message])?;
        object.insert(symbol_name.as_str().into(), Dynamic::from(pointer));
    }
    Ok(object)
}

fn make_symbol_fn(name: &str, symbol: NamedSymbol) -> Result<FnPtr, String> {
    let label = name.to_string();
    FnPtr::from_fn(name.to_string(), move |_ctx, args| {
        invoke_symbol(&label, symbol, args)
    })
    .map_err(|error| format!("symbol '{name}': {error}"))
}

/// Call one plugin symbol: arguments cross the boundary as a JSON array,
/// results come back as a JSON value. A null return from the plugin maps to
/// a script-level error the caller can catch.
fn invoke_symbol(
    name: &str,
    symbol: NamedSymbol,
    args: &mut [&mut Dynamic],
) -> Result<Dynamic, Box<EvalAltResult>> {
    // Method-style calls bind the namespace object as the first argument.
    let offset = usize::from(args.first().map_or(false, |a| is_namespace_value(a)));

    let mut json_args = Vec::with_capacity(args.len().saturating_sub(offset));
    for arg in args.iter().skip(offset) {
        let value: serde_json::Value =
            rhai::serde::from_dynamic(&**arg).unwrap_or(serde_json::Value::Null);
        json_args.push(value);
    }
    let payload = serde_json::Value::Array(json_args).to_string();
    let payload = CString::new(payload)
        .map_err(|error| -> Box<EvalAltResult> { error.to_string().into() })?;

    let raw = unsafe { (symbol.invoke)(payload.as_ptr()) };
    if raw.is_null() {
        return Err(format!("plugin call '{name}' failed").into());
    }
    let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
    if let Some(release) = symbol.release {
        unsafe { release(raw) };
    }

    let value: serde_json::Value =
        serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    rhai::serde::to_dynamic(value)
}

fn is_namespace_value(value: &Dynamic) -> bool {
    value
        .read_lock::<Map>()
        .map_or(false, |map| map.contains_key(NAMESPACE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace_map(name: &str) -> Map {
        let mut object = Map::new();
        object.insert(NAMESPACE_MARKER.into(), name.into());
        object
    }

    #[test]
    fn missing_library_reports_not_found() {
        let mut registry = BindingRegistry::new(PathBuf::from("/nonexistent"));
        let outcome = registry.attach_path("/nonexistent/geo.so", None);
        match outcome {
            AttachOutcome::Failed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(diagnostics[0].contains("not found"));
            }
            AttachOutcome::Attached { .. } => panic!("attachment cannot succeed"),
        }
    }

    #[test]
    fn failed_attachment_publishes_nothing() {
        let mut registry = BindingRegistry::new(PathBuf::from("/nonexistent"));
        let _ = registry.attach_path("/nonexistent/geo.so", Some("geo"));
        assert!(registry.resolve("geo").is_none());
    }

    #[test]
    fn report_collapses_outcomes_to_booleans() {
        let attached = AttachOutcome::Attached {
            source: "geo.so".to_string(),
            namespace: "geo".to_string(),
        };
        assert!(attached.report());
        let failed = AttachOutcome::Failed {
            diagnostics: vec!["geo.so not found.".to_string()],
        };
        assert!(!failed.report());
    }

    #[test]
    fn republishing_a_namespace_overwrites_the_previous_binding() {
        let mut registry = BindingRegistry::new(PathBuf::from("/tmp"));
        let mut first = namespace_map("geo");
        first.insert("generation".into(), Dynamic::from(1_i64));
        registry.publish("geo".to_string(), first);

        let mut second = namespace_map("geo");
        second.insert("generation".into(), Dynamic::from(2_i64));
        registry.publish("geo".to_string(), second);

        let resolved = registry.resolve("geo").expect("namespace published");
        let map = resolved.read_lock::<Map>().expect("namespace is a map");
        let generation = map
            .get("generation")
            .expect("marker field present")
            .as_int()
            .expect("generation is an int");
        assert_eq!(generation, 2);
    }

    #[test]
    fn library_file_names_carry_platform_affixes() {
        let name = library_file_name("geo");
        assert!(name.contains("geo"));
        assert_eq!(name, format!("{DLL_PREFIX}geo{DLL_SUFFIX}"));
    }
}
