//! Font families: which are loaded, which are in flight, and who is waiting for them.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context as _;

/// Identifies one font request made on behalf of one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontRequestToken(pub u64);

/// A family to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontRequest {
    pub family: String,
    pub token: FontRequestToken,
}

/// How a request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOutcome {
    /// The family is available; raw font file bytes.
    Active(Vec<u8>),
    /// The family could not be fetched.
    Inactive(String),
}

/// Completion of a [`FontRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontEvent {
    pub family: String,
    pub token: FontRequestToken,
    pub outcome: FontOutcome,
}

impl FontEvent {
    pub fn is_active(&self) -> bool {
        matches!(self.outcome, FontOutcome::Active(_))
    }
}

/// External font loader. Fire-and-forget: exactly one [`FontEvent`] per request goes to `done`.
pub trait FontService {
    fn load(&self, request: FontRequest, done: mpsc::Sender<FontEvent>);
}

/// Reports every family as unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFontService;

impl FontService for NoopFontService {
    fn load(&self, request: FontRequest, done: mpsc::Sender<FontEvent>) {
        let _ = done.send(FontEvent {
            family: request.family,
            token: request.token,
            outcome: FontOutcome::Inactive("no font service configured".to_owned()),
        });
    }
}

/// Loads `<dir>/<Family>.ttf` (or `.otf`, `.ttc`) on a background thread.
///
/// Spaces in the family name are also tried removed, so `Open Sans` finds `OpenSans.ttf`.
#[derive(Clone, Debug)]
pub struct DirectoryFontService {
    dir: PathBuf,
}

impl DirectoryFontService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, family: &str) -> Vec<PathBuf> {
        let mut stems = vec![family.to_owned()];
        let squashed: String = family.chars().filter(|c| !c.is_whitespace()).collect();
        if squashed != family {
            stems.push(squashed);
        }
        stems
            .iter()
            .flat_map(|stem| {
                ["ttf", "otf", "ttc"]
                    .into_iter()
                    .map(move |ext| self.dir.join(format!("{stem}.{ext}")))
            })
            .collect()
    }
}

fn read_first(paths: &[PathBuf]) -> anyhow::Result<Vec<u8>> {
    for p in paths {
        if p.is_file() {
            return std::fs::read(p).with_context(|| format!("read font file '{}'", p.display()));
        }
    }
    anyhow::bail!("no font file found (tried {} paths)", paths.len())
}

impl FontService for DirectoryFontService {
    fn load(&self, request: FontRequest, done: mpsc::Sender<FontEvent>) {
        if request.family.contains(['/', '\\']) || request.family.contains("..") {
            let _ = done.send(FontEvent {
                family: request.family,
                token: request.token,
                outcome: FontOutcome::Inactive("family name is not a plain name".to_owned()),
            });
            return;
        }
        let paths = self.candidates(&request.family);
        let spawned = std::thread::Builder::new()
            .name("layerstage-font".to_owned())
            .spawn({
                let done = done.clone();
                let request = request.clone();
                move || {
                    let outcome = match read_first(&paths) {
                        Ok(bytes) => FontOutcome::Active(bytes),
                        Err(err) => FontOutcome::Inactive(format!("{err:#}")),
                    };
                    let _ = done.send(FontEvent {
                        family: request.family,
                        token: request.token,
                        outcome,
                    });
                }
            });
        if let Err(err) = spawned {
            let _ = done.send(FontEvent {
                family: request.family,
                token: request.token,
                outcome: FontOutcome::Inactive(format!("spawn font loader: {err}")),
            });
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Pending {
    token: FontRequestToken,
    family: String,
}

/// Bookkeeping of font families across edits.
///
/// Each instance has at most one pending request. A completion settles only the instances whose
/// current request still names the completed family; anything they asked for later wins.
#[derive(Clone, Debug, Default)]
pub struct FontRegistry {
    loaded: HashSet<String>,
    in_flight: HashSet<String>,
    pending: HashMap<String, Pending>,
    next_token: u64,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.loaded.contains(family)
    }

    pub fn is_in_flight(&self, family: &str) -> bool {
        self.in_flight.contains(family)
    }

    /// Families requested but not yet settled.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn mark_loaded(&mut self, family: impl Into<String>) {
        self.loaded.insert(family.into());
    }

    /// Record that `instance_id` now wants `family`.
    ///
    /// Returns the new token and whether the caller must dispatch a load; a family already in
    /// flight is not requested twice.
    pub fn begin(&mut self, instance_id: &str, family: &str) -> (FontRequestToken, bool) {
        self.next_token += 1;
        let token = FontRequestToken(self.next_token);
        self.pending.insert(
            instance_id.to_owned(),
            Pending {
                token,
                family: family.to_owned(),
            },
        );
        let dispatch = self.in_flight.insert(family.to_owned());
        (token, dispatch)
    }

    /// Drop the instance's pending request, if any.
    pub fn forget(&mut self, instance_id: &str) {
        self.pending.remove(instance_id);
    }

    pub fn pending_token(&self, instance_id: &str) -> Option<FontRequestToken> {
        self.pending.get(instance_id).map(|p| p.token)
    }

    /// Apply the completion of `family`. Returns the instances it settles, with their tokens, in
    /// token order.
    pub fn settle(&mut self, family: &str, active: bool) -> Vec<(String, FontRequestToken)> {
        self.in_flight.remove(family);
        if active {
            self.loaded.insert(family.to_owned());
        }
        let mut settled: Vec<(String, FontRequestToken)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.family == family)
            .map(|(id, p)| (id.clone(), p.token))
            .collect();
        settled.sort_by_key(|(_, t)| *t);
        for (id, _) in &settled {
            self.pending.remove(id);
        }
        settled
    }

    /// Drop every pending request. Loaded families stay loaded.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/binding/fonts.rs"]
mod tests;
