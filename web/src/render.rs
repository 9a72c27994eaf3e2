//! HTML for the todo page.
//!
//! Every interactive control is a small `<form>` posting one intent, so the
//! page works without scripts. Disabled controls are rendered `disabled`.

use std::borrow::Cow;
use std::fmt::{self, Write};

use todo_client::view::{EMPTY_TEXT, LOADING_TEXT};
use todo_client::{FormView, ListView, TodoPageView, ToastLevel, ToastView};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#111;color:#eee;margin:0}\
main{max-width:28rem;margin:2.5rem auto;padding:1.5rem;border:1px solid #333;border-radius:.5rem}\
h1{margin:0 0 .25rem}p.description{margin:0 0 1.5rem;color:#999}\
form.create{display:flex;gap:.5rem;margin-bottom:1.5rem}form.create input{flex:1}\
p.error{color:#ef4444}ul{list-style:none;padding:0}\
li{display:flex;justify-content:space-between;align-items:center;border:1px solid #333;border-radius:.375rem;padding:.5rem;margin-bottom:.5rem}\
li form{display:inline}.line-through{text-decoration:line-through}p.empty{text-align:center;padding:1rem 0}\
.toasts{position:fixed;bottom:1rem;right:1rem}.toast{padding:.75rem;margin-top:.5rem;border-radius:.375rem}\
.toast.success{background:#14532d}.toast.error{background:#7f1d1d}.toast form{display:inline;margin-left:.5rem}";

fn text(value: &str) -> Cow<'_, str> {
    html_escape::encode_text(value)
}

fn attr(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

fn disabled(flag: bool) -> &'static str {
    if flag {
        " disabled"
    } else {
        ""
    }
}

pub fn page(view: &TodoPageView) -> Result<String, fmt::Error> {
    let mut html = String::new();
    write!(
        html,
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title}</title><style>{STYLE}</style></head><body><main>\
         <h1>{title}</h1><p class=\"description\">{description}</p>",
        title = text(view.title),
        description = text(view.description),
    )?;
    form(&mut html, &view.form)?;
    list(&mut html, &view.list)?;
    html.push_str("</main>");
    toasts(&mut html, &view.toasts)?;
    html.push_str("</body></html>");
    Ok(html)
}

fn form(html: &mut String, form: &FormView) -> fmt::Result {
    write!(
        html,
        "<form class=\"create\" method=\"post\" action=\"/todos\">\
         <input name=\"title\" value=\"{value}\" placeholder=\"{placeholder}\" autocomplete=\"off\"{input_disabled}>\
         <button type=\"submit\"{submit_disabled}>{label}</button></form>",
        value = attr(&form.value),
        placeholder = attr(form.placeholder),
        input_disabled = disabled(form.input_disabled),
        submit_disabled = disabled(form.submit_disabled),
        label = if form.submitting { "Adding..." } else { "Add" },
    )?;
    if let Some(errors) = &form.error_text {
        write!(html, "<p class=\"error\">{}</p>", text(errors))?;
    }
    Ok(())
}

fn list(html: &mut String, list: &ListView) -> fmt::Result {
    match list {
        ListView::Loading => write!(html, "<p class=\"loading\">{}</p>", text(LOADING_TEXT)),
        ListView::Unavailable => Ok(()),
        ListView::Empty => write!(html, "<p class=\"empty\">{}</p>", text(EMPTY_TEXT)),
        ListView::Rows(rows) => {
            html.push_str("<ul>");
            for row in rows {
                write!(
                    html,
                    "<li data-key=\"{key}\">\
                     <form method=\"post\" action=\"/todos/{key}/toggle\">\
                     <button type=\"submit\" id=\"{dom_id}\" role=\"checkbox\" aria-checked=\"{checked}\"{toggle_disabled}>{mark}</button>\
                     <label for=\"{dom_id}\"{class}>{title}</label></form>\
                     <form method=\"post\" action=\"/todos/{key}/delete\">\
                     <button type=\"submit\" aria-label=\"Delete todo\"{delete_disabled}>&#128465;</button></form></li>",
                    key = row.key,
                    dom_id = attr(&row.dom_id),
                    checked = row.checked,
                    toggle_disabled = disabled(row.toggle_disabled),
                    mark = if row.checked { "&#9745;" } else { "&#9744;" },
                    class = if row.struck_through { " class=\"line-through\"" } else { "" },
                    title = text(&row.title),
                    delete_disabled = disabled(row.delete_disabled),
                )?;
            }
            html.push_str("</ul>");
            Ok(())
        }
    }
}

fn toasts(html: &mut String, toasts: &[ToastView]) -> fmt::Result {
    if toasts.is_empty() {
        return Ok(());
    }
    html.push_str("<section class=\"toasts\">");
    for toast in toasts {
        let level = match toast.level {
            ToastLevel::Success => "success",
            ToastLevel::Error => "error",
        };
        write!(
            html,
            "<div class=\"toast {level}\" role=\"status\">{message}",
            message = text(&toast.message),
        )?;
        if let Some(label) = toast.action_label {
            write!(
                html,
                "<form method=\"post\" action=\"/toasts/{id}/retry\"><button type=\"submit\">{label}</button></form>",
                id = toast.id,
                label = text(label),
            )?;
        }
        write!(
            html,
            "<form method=\"post\" action=\"/toasts/{id}/dismiss\"><button type=\"submit\" aria-label=\"Dismiss\">&times;</button></form></div>",
            id = toast.id,
        )?;
    }
    html.push_str("</section>");
    Ok(())
}
