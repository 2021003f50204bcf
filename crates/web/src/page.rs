//! HTML rendering of the synthesis form.

use quick_xml::escape::escape;
use speak_core::Voice;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem;font-weight:bold}\
textarea,select,input[type=url]{width:100%;box-sizing:border-box}\
textarea{height:12rem}\
.warning{background:#fff3cd;border:1px solid #e0c060;padding:.6rem;margin:1rem 0}\
button{margin-top:1.2rem;padding:.5rem 1.5rem}";

/// Everything the form shows.
#[derive(Debug, Default)]
pub struct FormPage<'a> {
    /// Locales offered by the filter.
    pub locales: &'a [String],
    /// Active locale filter; `None` shows all voices.
    pub locale: Option<&'a str>,
    /// Voices offered by the selector.
    pub voices: &'a [&'a Voice],
    /// Previously chosen voice, kept selected on re-render.
    pub voice: Option<&'a str>,
    /// Previously typed text.
    pub text: &'a str,
    /// Previously entered link.
    pub link: &'a str,
    /// Message shown above the form.
    pub warning: Option<&'a str>,
}

impl FormPage<'_> {
    /// Render the full HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(8 * 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Text to Speech</title>\n");
        let _ = writeln!(html, "<style>{}</style>", STYLE);
        html.push_str("</head>\n<body>\n<h1>Text to Speech</h1>\n");

        if let Some(warning) = self.warning {
            let _ = writeln!(html, "<div class=\"warning\">{}</div>", escape(warning));
        }

        self.render_locale_filter(&mut html);
        self.render_synthesis_form(&mut html);

        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_locale_filter(&self, html: &mut String) {
        html.push_str("<form method=\"get\" action=\"/\">\n");
        html.push_str("<label for=\"locale\">Language</label>\n");
        html.push_str("<select id=\"locale\" name=\"locale\" onchange=\"this.form.submit()\">\n");
        push_option(html, "", "All", self.locale.is_none());
        for locale in self.locales {
            push_option(html, locale, locale, self.locale == Some(locale.as_str()));
        }
        html.push_str("</select>\n<noscript><button type=\"submit\">Filter</button></noscript>\n</form>\n");
    }

    fn render_synthesis_form(&self, html: &mut String) {
        html.push_str("<form method=\"post\" action=\"/synthesize\" enctype=\"multipart/form-data\">\n");

        if let Some(locale) = self.locale {
            let _ = writeln!(
                html,
                "<input type=\"hidden\" name=\"locale\" value=\"{}\">",
                escape(locale)
            );
        }

        html.push_str("<label for=\"voice\">Voice</label>\n");
        html.push_str("<select id=\"voice\" name=\"voice\" required>\n");
        push_option(html, "", "Choose a voice", self.voice.is_none());
        for voice in self.voices {
            let selected = self
                .voice
                .is_some_and(|v| v == voice.short_name || v == voice.name);
            push_option(html, &voice.short_name, &voice.display_label(), selected);
        }
        html.push_str("</select>\n");

        html.push_str("<label for=\"text\">Text</label>\n");
        let _ = writeln!(
            html,
            "<textarea id=\"text\" name=\"text\">{}</textarea>",
            escape(self.text)
        );

        html.push_str("<label for=\"file\">Or upload a document</label>\n");
        html.push_str("<input id=\"file\" type=\"file\" name=\"file\" accept=\".pdf,.docx,.txt\">\n");

        html.push_str("<label for=\"link\">Or paste a Google Drive link</label>\n");
        let _ = writeln!(
            html,
            "<input id=\"link\" type=\"url\" name=\"link\" value=\"{}\">",
            escape(self.link)
        );

        html.push_str("<button type=\"submit\">Convert to audio</button>\n</form>\n");
    }
}

fn push_option(html: &mut String, value: &str, label: &str, selected: bool) {
    let _ = writeln!(
        html,
        "<option value=\"{}\"{}>{}</option>",
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(short_name: &str, locale: &str) -> Voice {
        Voice {
            name: format!("Microsoft Server Speech Text to Speech Voice ({})", short_name),
            short_name: short_name.to_string(),
            friendly_name: format!("Microsoft {}", short_name),
            locale: locale.to_string(),
            gender: "Female".to_string(),
        }
    }

    #[test]
    fn test_render_lists_voices_and_locales() {
        let aria = voice("en-US-AriaNeural", "en-US");
        let dalia = voice("es-MX-DaliaNeural", "es-MX");
        let voices = [&aria, &dalia];
        let locales = vec!["en-US".to_string(), "es-MX".to_string()];

        let html = FormPage {
            locales: &locales,
            voices: &voices,
            voice: Some("es-MX-DaliaNeural"),
            ..FormPage::default()
        }
        .render();

        assert!(html.contains("<option value=\"\" selected>All</option>"));
        assert!(html.contains("<option value=\"es-MX\">es-MX</option>"));
        assert!(html.contains(
            "<option value=\"en-US-AriaNeural\">Microsoft en-US-AriaNeural (Female, en-US)</option>"
        ));
        assert!(html.contains("<option value=\"es-MX-DaliaNeural\" selected>"));
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(!html.contains("class=\"warning\""));
    }

    #[test]
    fn test_locale_filter_kept() {
        let locales = vec!["en-US".to_string(), "es-MX".to_string()];
        let html = FormPage {
            locales: &locales,
            locale: Some("es-MX"),
            ..FormPage::default()
        }
        .render();

        assert!(html.contains("<option value=\"es-MX\" selected>es-MX</option>"));
        assert!(html.contains("<option value=\"\">All</option>"));
        assert!(html.contains("<input type=\"hidden\" name=\"locale\" value=\"es-MX\">"));
    }

    #[test]
    fn test_user_input_escaped() {
        let html = FormPage {
            text: "</textarea><script>alert(1)</script>",
            link: "\"><b>",
            warning: Some("Bad <input> & more"),
            ..FormPage::default()
        }
        .render();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains("value=\"&quot;&gt;&lt;b&gt;\""));
        assert!(html.contains("<div class=\"warning\">Bad &lt;input&gt; &amp; more</div>"));
    }
}
