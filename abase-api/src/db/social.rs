//! Follows, comments, ratings and playlists

use abase_common::db::{Comment, Playlist, PlaylistTrack};
use abase_common::time;
use sqlx::SqlitePool;

// ========================================
// Follows
// ========================================

/// Returns false if the follow already existed
pub async fn follow(pool: &SqlitePool, follower_id: &str, artist_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO follows (follower_id, artist_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(follower_id)
    .bind(artist_id)
    .bind(time::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns false if there was nothing to remove
pub async fn unfollow(pool: &SqlitePool, follower_id: &str, artist_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND artist_id = ?")
        .bind(follower_id)
        .bind(artist_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn followers(pool: &SqlitePool, artist_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT follower_id FROM follows WHERE artist_id = ? ORDER BY created_at, follower_id",
    )
    .bind(artist_id)
    .fetch_all(pool)
    .await
}

// ========================================
// Comments
// ========================================

pub async fn insert_comment(
    pool: &SqlitePool,
    user_id: &str,
    track_id: &str,
    body: &str,
) -> Result<Comment, sqlx::Error> {
    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        track_id: track_id.to_string(),
        body: body.to_string(),
        created_at: time::now(),
    };

    sqlx::query(
        "INSERT INTO comments (id, user_id, track_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.user_id)
    .bind(&comment.track_id)
    .bind(&comment.body)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    Ok(comment)
}

pub async fn get_comment(pool: &SqlitePool, id: &str) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Oldest first
pub async fn comments_for_track(pool: &SqlitePool, track_id: &str) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE track_id = ? ORDER BY created_at, id",
    )
    .bind(track_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_comment(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ========================================
// Ratings
// ========================================

pub async fn upsert_rating(
    pool: &SqlitePool,
    user_id: &str,
    track_id: &str,
    score: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ratings (user_id, track_id, score, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, track_id) DO UPDATE SET
            score = excluded.score,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(track_id)
    .bind(score)
    .bind(time::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// (average, count); average is None when nobody has rated
pub async fn rating_summary(pool: &SqlitePool, track_id: &str) -> Result<(Option<f64>, i64), sqlx::Error> {
    sqlx::query_as("SELECT AVG(score), COUNT(*) FROM ratings WHERE track_id = ?")
        .bind(track_id)
        .fetch_one(pool)
        .await
}

pub async fn user_rating(pool: &SqlitePool, user_id: &str, track_id: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT score FROM ratings WHERE user_id = ? AND track_id = ?")
        .bind(user_id)
        .bind(track_id)
        .fetch_optional(pool)
        .await
}

// ========================================
// Playlists
// ========================================

pub async fn insert_playlist(
    pool: &SqlitePool,
    owner_id: &str,
    name: &str,
    is_public: bool,
) -> Result<Playlist, sqlx::Error> {
    let playlist = Playlist {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        is_public,
        created_at: time::now(),
    };

    sqlx::query(
        "INSERT INTO playlists (id, owner_id, name, is_public, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&playlist.id)
    .bind(&playlist.owner_id)
    .bind(&playlist.name)
    .bind(playlist.is_public)
    .bind(playlist.created_at)
    .execute(pool)
    .await?;

    Ok(playlist)
}

pub async fn get_playlist(pool: &SqlitePool, id: &str) -> Result<Option<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn playlists_for_owner(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(
        "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC, id",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn playlist_tracks(pool: &SqlitePool, playlist_id: &str) -> Result<Vec<PlaylistTrack>, sqlx::Error> {
    sqlx::query_as::<_, PlaylistTrack>(
        "SELECT track_id, position, added_at FROM playlist_tracks WHERE playlist_id = ? ORDER BY position",
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await
}

/// Append at the end; returns None if the track is already on the playlist
///
/// The position is computed inside the INSERT so concurrent appends never
/// share one.
pub async fn append_track(
    pool: &SqlitePool,
    playlist_id: &str,
    track_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position, added_at)
        SELECT ?, ?, COALESCE(MAX(position) + 1, 0), ?
        FROM playlist_tracks WHERE playlist_id = ?
        RETURNING position
        "#,
    )
    .bind(playlist_id)
    .bind(track_id)
    .bind(time::now())
    .bind(playlist_id)
    .fetch_optional(pool)
    .await
}

pub async fn remove_track(pool: &SqlitePool, playlist_id: &str, track_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND track_id = ?")
        .bind(playlist_id)
        .bind(track_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
