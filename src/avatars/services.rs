use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use image::{imageops::FilterType, ImageFormat, ImageReader, Limits};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    users::repo::UserStore,
};

/// Largest accepted upload, in bytes.
pub const MAX_AVATAR_BYTES: usize = 1_000_000;
/// Width of every stored avatar; height follows the aspect ratio.
pub const AVATAR_WIDTH: u32 = 250;
/// Tallest stored avatar; narrower aspect ratios are rejected.
pub const MAX_AVATAR_HEIGHT: u32 = AVATAR_WIDTH * 10;
pub const AVATAR_CONTENT_TYPE: &str = "image/png";

const MAX_DECODED_SIDE: u32 = 10_000;
const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Checks size and extension, then resizes and re-encodes as PNG.
pub async fn accept(raw: Bytes, original_filename: &str) -> Result<Bytes> {
    if raw.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {MAX_AVATAR_BYTES} bytes."
        )));
    }
    if !has_allowed_extension(original_filename) {
        return Err(AppError::Validation(
            "Please upload a PNG, JPG or JPEG file.".to_string(),
        ));
    }

    let size = raw.len();
    let normalized = tokio::task::spawn_blocking(move || normalize(&raw))
        .await
        .context("avatar worker panicked")??;

    debug!(input_bytes = size, output_bytes = normalized.len(), "avatar normalized");
    Ok(normalized)
}

fn decode(raw: &[u8]) -> Result<image::DynamicImage> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODED_SIDE);
    limits.max_image_height = Some(MAX_DECODED_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let invalid = || AppError::Validation("Please upload a valid image.".to_string());
    let mut reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|_| invalid())?;
    reader.limits(limits);
    reader.decode().map_err(|_| invalid())
}

/// Height of the resized avatar, or `None` when it would exceed `MAX_AVATAR_HEIGHT`.
fn scaled_height(width: u32, height: u32) -> Option<u32> {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let scaled = ((h * u64::from(AVATAR_WIDTH) + w / 2) / w).max(1);
    u32::try_from(scaled)
        .ok()
        .filter(|&scaled| scaled <= MAX_AVATAR_HEIGHT)
}

fn normalize(raw: &[u8]) -> Result<Bytes> {
    let img = decode(raw)?;

    let height = scaled_height(img.width(), img.height()).ok_or_else(|| {
        AppError::Validation(format!(
            "Image is too narrow. Height may be at most {} times the width.",
            MAX_AVATAR_HEIGHT / AVATAR_WIDTH
        ))
    })?;
    let resized = img.resize_exact(AVATAR_WIDTH, height, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .context("encode avatar as png")?;
    Ok(Bytes::from(out.into_inner()))
}

pub async fn attach(users: &dyn UserStore, user_id: Uuid, avatar: Bytes) -> Result<()> {
    if !users.set_avatar(user_id, Some(avatar.to_vec())).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id = %user_id, bytes = avatar.len(), "avatar attached");
    Ok(())
}

/// Fails with `NotFound` when there is no avatar to remove.
pub async fn detach(users: &dyn UserStore, user_id: Uuid) -> Result<()> {
    let has_avatar = users
        .find_by_id(user_id)
        .await?
        .map(|u| u.avatar.is_some())
        .unwrap_or(false);
    if !has_avatar || !users.set_avatar(user_id, None).await? {
        return Err(AppError::NotFound("User avatar not found".into()));
    }
    info!(user_id = %user_id, "avatar removed");
    Ok(())
}

pub async fn fetch(users: &dyn UserStore, user_id: Uuid) -> Result<Bytes> {
    users
        .find_by_id(user_id)
        .await?
        .and_then(|u| u.avatar)
        .map(Bytes::from)
        .ok_or_else(|| AppError::NotFound("User avatar not found".into()))
}
