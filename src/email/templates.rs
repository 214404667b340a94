use crate::submission::{FileField, Submission};

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn html_list(items: &[String]) -> String {
    if items.is_empty() {
        return "<p>–</p>".to_string();
    }
    let lis: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    format!("<ul>{lis}</ul>")
}

fn text_list(items: &[String]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn file_name(file: &Option<FileField>) -> &str {
    file.as_ref().map(|f| f.filename.as_str()).unwrap_or("-")
}

fn yes_no(b: bool) -> &'static str {
    if b { "Ja" } else { "Nein" }
}

pub fn render_text(s: &Submission) -> String {
    format!(
        "Neue Anfrage zur Vollversion

[Kontakt]
Anrede: {salutation}
Name:   {first} {last}
E-Mail: {email}

[Unternehmen]
Name:      {company}
Anschrift: {address}

[App-Konfiguration]
Praxisname (App-Titel): {title}
Nutzeranzahl: {users}

Behandler:innen:
{practitioners}

Play-Store-Zugriff (Google-Konten):
{play}

[Uploads]
Behandlungen: {treatments}
Logo:         {logo}

B2B bestätigt: {b2b}
",
        salutation = s.salutation,
        first = s.first_name,
        last = s.last_name,
        email = s.email,
        company = s.company_name,
        address = s.company_address,
        title = s.app_title,
        users = s.user_count_label(),
        practitioners = text_list(&s.practitioners),
        play = text_list(&s.play_store_emails),
        treatments = file_name(&s.treatments_file),
        logo = file_name(&s.logo_file),
        b2b = yes_no(s.b2b_confirmed),
    )
}

pub fn render_html(s: &Submission) -> String {
    format!(
        r#"<div>
  <p><strong>Neue Anfrage zur Vollversion</strong></p>

  <h3>Kontakt</h3>
  <p>Anrede: {salutation}<br>
  Name: {first} {last}<br>
  E-Mail: {email}</p>

  <h3>Unternehmen</h3>
  <p>Name: {company}<br>
  Anschrift:<br>{address}</p>

  <h3>App-Konfiguration</h3>
  <p>Praxisname (App-Titel): {title}<br>
  Nutzeranzahl: {users}</p>

  <h4>Behandler:innen</h4>
  {practitioners}

  <h4>Play-Store-Zugriff (Google-Konten)</h4>
  {play}

  <h3>Uploads</h3>
  <p>Behandlungen: {treatments}<br>
  Logo: {logo}</p>

  <p><strong>B2B bestätigt:</strong> {b2b}</p>
</div>"#,
        salutation = escape_html(&s.salutation),
        first = escape_html(&s.first_name),
        last = escape_html(&s.last_name),
        email = escape_html(&s.email),
        company = escape_html(&s.company_name),
        address = escape_html(&s.company_address).replace('\n', "<br>"),
        title = escape_html(&s.app_title),
        users = escape_html(&s.user_count_label()).replace(' ', "&nbsp;"),
        practitioners = html_list(&s.practitioners),
        play = html_list(&s.play_store_emails),
        treatments = escape_html(file_name(&s.treatments_file)),
        logo = escape_html(file_name(&s.logo_file)),
        b2b = yes_no(s.b2b_confirmed),
    )
}
