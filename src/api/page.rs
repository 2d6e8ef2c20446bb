//! Minimal HTML presentation of a signed-in session or a failure.

use crate::{error::AuthError, flow::Session, utils::escape_html};

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:40rem;margin:3rem auto;}\
img{border-radius:50%;}li{margin:.25rem 0;}.error{color:#b00020;}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\"><title>{}</title>\
<style>{}</style></head><body>{}</body></html>",
        escape_html(title),
        STYLE,
        body
    )
}

fn link(href: Option<&str>, text: Option<&str>) -> String {
    let text = escape_html(text.unwrap_or(""));
    match href {
        Some(href) => format!("<a href=\"{}\">{}</a>", escape_html(href), text),
        None => text,
    }
}

pub fn profile_page(session: &Session) -> String {
    let profile = &session.profile;
    let mut body = String::from("<h1>Display your Spotify profile data</h1><section id=\"profile\">");

    body.push_str(&format!(
        "<h2>Logged in as <span id=\"displayName\">{}</span></h2>",
        escape_html(profile.name())
    ));

    if let Some(image) = profile.avatar() {
        body.push_str(&format!(
            "<span id=\"avatar\"><img src=\"{url}\" width=\"200\" height=\"200\" alt=\"avatar\"></span>",
            url = escape_html(&image.url)
        ));
    }

    body.push_str("<ul>");
    body.push_str(&format!(
        "<li>User ID: <span id=\"id\">{}</span></li>",
        escape_html(&profile.id)
    ));
    body.push_str(&format!(
        "<li>Email: <span id=\"email\">{}</span></li>",
        escape_html(profile.email.as_deref().unwrap_or(""))
    ));
    body.push_str(&format!(
        "<li>Spotify URI: {}</li>",
        link(profile.external_urls.spotify.as_deref(), profile.uri.as_deref())
    ));
    body.push_str(&format!(
        "<li>Link: {}</li>",
        link(profile.href.as_deref(), profile.href.as_deref())
    ));
    if let Some(image) = profile.avatar() {
        body.push_str(&format!(
            "<li>Profile Image: <span id=\"imgUrl\">{}</span></li>",
            escape_html(&image.url)
        ));
    }
    body.push_str("</ul></section>");

    if let Some(top) = &session.top_tracks {
        body.push_str("<section id=\"top-tracks\"><h2>Top tracks</h2><ol>");
        for track in &top.items {
            body.push_str(&format!(
                "<li>{} &mdash; {}</li>",
                link(track.external_urls.spotify.as_deref(), Some(&track.name)),
                escape_html(&track.artist_names())
            ));
        }
        body.push_str("</ol></section>");
    }
    if let Some(err) = &session.top_tracks_error {
        body.push_str(&format!(
            "<section id=\"top-tracks\"><h2>Top tracks</h2><p class=\"error\">{}</p></section>",
            escape_html(err)
        ));
    }

    layout("Spotify profile", &body)
}

pub fn error_page(err: &AuthError) -> String {
    let body = format!(
        "<h1 class=\"error\">{}</h1><p>{}</p><p>Close this window and run the sign-in again.</p>",
        escape_html(err.category()),
        escape_html(&err.to_string())
    );
    layout(err.category(), &body)
}
