//! Ordered photo/video lists attached to a property.
//!
//! # Invariants
//! - Order is meaningful and preserved through persistence.
//! - The first photo is the cover; without photos the first video stands in.

use serde::{Deserialize, Serialize};

/// Which list a media URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Cover reference returned for list thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cover<'a> {
    pub kind: MediaKind,
    pub url: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMedia {
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

impl PropertyMedia {
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.videos.is_empty()
    }

    pub fn cover(&self) -> Option<Cover<'_>> {
        if let Some(url) = self.photos.first() {
            return Some(Cover {
                kind: MediaKind::Photo,
                url,
            });
        }
        self.videos.first().map(|url| Cover {
            kind: MediaKind::Video,
            url,
        })
    }

    /// Moves the photo at `index` to the front, keeping the others in order.
    ///
    /// Returns `false` when `index` is out of range.
    pub fn set_cover(&mut self, index: usize) -> bool {
        if index >= self.photos.len() {
            return false;
        }
        self.photos[..=index].rotate_right(1);
        true
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<String> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub fn remove_video(&mut self, index: usize) -> Option<String> {
        (index < self.videos.len()).then(|| self.videos.remove(index))
    }

    /// Appends uploaded URLs, skipping blanks.
    pub fn add_photos<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_non_blank(&mut self.photos, urls);
    }

    pub fn add_videos<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_non_blank(&mut self.videos, urls);
    }
}

fn push_non_blank<I, S>(target: &mut Vec<String>, urls: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for url in urls {
        let url = url.into();
        if !url.trim().is_empty() {
            target.push(url);
        }
    }
}

/// Wrapping cursor for the photo gallery and lightbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryCursor {
    index: usize,
    len: usize,
}

impl GalleryCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Starts at `index`, clamped to the last item.
    pub fn at(index: usize, len: usize) -> Self {
        Self {
            index: index.min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn forward(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    pub fn back(&mut self) -> usize {
        if self.len > 0 {
            self.index = if self.index == 0 {
                self.len - 1
            } else {
                self.index - 1
            };
        }
        self.index
    }
}
