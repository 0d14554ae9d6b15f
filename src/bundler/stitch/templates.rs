//! JavaScript emitted around bundler chunks.

/// Template name of the shared chunk prelude for platforms without an ambient
/// global object.
pub const SHARED_NAMESPACE: &str = "shared-namespace";

/// Template name of the entry prelude for platforms that do not link the
/// sharing namespace into package scope.
pub const ENTRY_LINK: &str = "entry-link";

/// Declares the sharing namespace ahead of the shared chunk.
pub const SHARED_NAMESPACE_TEMPLATE: &str = "{{namespace}} = {};\n{{chunk}}";

/// Deep-merges the published namespace into the entry module's scope.
pub const ENTRY_LINK_TEMPLATE: &str = r#"function {{namespace}}Extend(target, source) {
    target = target || {};
    for (var prop in source) {
        if (typeof source[prop] === 'object' && source[prop] !== null) {
            target[prop] = {{namespace}}Extend(target[prop], source[prop]);
        } else {
            target[prop] = source[prop];
        }
    }
    return target;
}
{{namespace}}Extend(this, Package['{{own_package}}'].{{namespace}});
{{chunk}}"#;
