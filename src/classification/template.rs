//! Template Renderer
//!
//! Renders `<<name>>` placeholders from node attributes. Placeholders are
//! first rewritten to `${name}` and then substituted with safe semantics:
//! names that are not in the attribute map stay in the output untouched.
//!
//! Substitution rules:
//!
//! - `$$` renders a single `$`
//! - `$name` and `${name}` are placeholders, where `name` is
//!   `[A-Za-z_][A-Za-z0-9_]*`
//! - any other `$` is copied as is

use super::attributes::NodeAttributes;
use regex_lite::{Captures, Regex};
use std::sync::OnceLock;

/// `$$`, `$name` or `${name}`
const PLACEHOLDER_PATTERN: &str =
    r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\})";

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid placeholder regex"))
}

/// Rewrite `<<` / `>>` delimiters into `${` / `}`
pub fn translate(template: &str) -> String {
    template.replace("<<", "${").replace(">>", "}")
}

/// Render a `<<name>>` template against node attributes
pub fn render(template: &str, attrs: &NodeAttributes) -> String {
    safe_substitute(&translate(template), attrs)
}

/// Substitute `$name` / `${name}` placeholders, leaving unknown ones intact
pub fn safe_substitute(template: &str, attrs: &NodeAttributes) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match attrs.get(name) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> NodeAttributes {
        [
            ("env", "prod"),
            ("role", "web"),
            ("host", "web01"),
            ("cluster_name", "lab"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_render_known_placeholders() {
        assert_eq!(render("<<env>>", &attrs()), "prod");
        assert_eq!(
            render("cluster.<<cluster_name>>.<<role>>", &attrs()),
            "cluster.lab.web"
        );
    }

    #[test]
    fn test_render_without_placeholders_is_identity() {
        for s in ["", "base.linux", "system.salt.minion", "a__equals__b", "all"] {
            assert_eq!(render(s, &attrs()), s);
        }
    }

    #[test]
    fn test_unknown_placeholder_preserved() {
        assert_eq!(render("<<nope>>", &attrs()), "${nope}");
        assert_eq!(render("x.<<nope>>.<<env>>", &attrs()), "x.${nope}.prod");
    }

    #[test]
    fn test_no_recursive_substitution() {
        let attrs: NodeAttributes = [("a", "<<b>>"), ("b", "deep"), ("c", "${b}")]
            .into_iter()
            .collect();
        assert_eq!(render("<<a>>", &attrs), "<<b>>");
        assert_eq!(render("<<c>>", &attrs), "${b}");
    }

    #[test]
    fn test_dollar_forms() {
        assert_eq!(safe_substitute("cost $$5", &attrs()), "cost $5");
        assert_eq!(safe_substitute("$env-$role", &attrs()), "prod-web");
        assert_eq!(safe_substitute("${bad-name}", &attrs()), "${bad-name}");
        assert_eq!(safe_substitute("${env", &attrs()), "${env");
        assert_eq!(safe_substitute("trailing $", &attrs()), "trailing $");
        assert_eq!(safe_substitute("$1", &attrs()), "$1");
    }

    #[test]
    fn test_dotted_placeholder_is_not_an_identifier() {
        assert_eq!(render("<<role.name>>", &attrs()), "${role.name}");
    }

    #[test]
    fn test_non_ascii_text_passes_through() {
        assert_eq!(render("nœud-<<host>>-ü", &attrs()), "nœud-web01-ü");
    }
}
