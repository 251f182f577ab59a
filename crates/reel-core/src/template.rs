//! Best-effort placeholder substitution for prompt templates.
//!
//! `{name}` placeholders are replaced by value; anything unresolved is left
//! verbatim. This is deliberately not an interpolation language — no
//! escaping, no conditionals, no error on unknown names.

/// Substitute `{key}` placeholders in `template`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let out = render(
            "Video {title} in {section}",
            &[("title", "Intro"), ("section", "Module 1")],
        );
        assert_eq!(out, "Video Intro in Module 1");
    }

    #[test]
    fn test_render_leaves_unresolved_verbatim() {
        let out = render("Video {title} for {audience}", &[("title", "Intro")]);
        assert_eq!(out, "Video Intro for {audience}");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let out = render("{title} / {title}", &[("title", "Intro")]);
        assert_eq!(out, "Intro / Intro");
    }

    #[test]
    fn test_render_empty_value() {
        let out = render("ctx: {course_context}.", &[("course_context", "")]);
        assert_eq!(out, "ctx: .");
    }

    #[test]
    fn test_render_no_placeholders() {
        assert_eq!(render("plain text", &[("title", "x")]), "plain text");
    }
}
