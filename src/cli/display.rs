use tabled::Table;

use crate::types::{Profile, ProfileTableRow, TopTracks, TrackTableRow};

pub fn profile_rows(profile: &Profile) -> Vec<ProfileTableRow> {
    let mut rows = vec![
        row("Display name", profile.name()),
        row("User ID", &profile.id),
        row("Email", profile.email.as_deref().unwrap_or("-")),
        row("Spotify URI", profile.uri.as_deref().unwrap_or("-")),
        row(
            "Link",
            profile
                .external_urls
                .spotify
                .as_deref()
                .or(profile.href.as_deref())
                .unwrap_or("-"),
        ),
    ];

    if let Some(image) = profile.avatar() {
        rows.push(row("Profile image", &image.url));
    }
    if let Some(followers) = &profile.followers {
        rows.push(row("Followers", &followers.total.to_string()));
    }
    if let Some(product) = &profile.product {
        rows.push(row("Product", product));
    }

    rows
}

pub fn profile_table(profile: &Profile) -> Table {
    Table::new(profile_rows(profile))
}

pub fn top_tracks_table(top: &TopTracks) -> Table {
    let rows: Vec<TrackTableRow> = top
        .items
        .iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            rank: i + 1,
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track
                .album
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
        })
        .collect();

    Table::new(rows)
}

fn row(field: &str, value: &str) -> ProfileTableRow {
    ProfileTableRow {
        field: field.to_string(),
        value: value.to_string(),
    }
}
