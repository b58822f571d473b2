//! Uniform random descent from a folder to a file
//!
//! At every level the choices are "enter subfolder i" for each subfolder,
//! plus one "take a file from here" choice when the folder has files. The
//! walk is as deep as the remote tree, capped at [`MAX_DEPTH`].

use crate::cache::{filter_nodes, Folder, FolderCache};
use crate::error::{DrivepickError, DrivepickResult};
use crate::select::{Attempt, Pick, Rejection, MAX_DEPTH};
use rand::Rng;
use tracing::debug;

/// Walk down from `folder` until a file is chosen or an empty folder is hit
///
/// The returned path is relative to `folder` and does not include its name.
pub async fn descend<R>(
    cache: &FolderCache,
    folder: Folder,
    rng: &mut R,
) -> DrivepickResult<Attempt<Pick>>
where
    R: Rng + ?Sized + Send,
{
    let mut current = folder;
    let mut segments: Vec<String> = Vec::new();
    let mut trail = vec![current.id().to_string()];

    for _ in 0..=MAX_DEPTH {
        let has_files = current.nr_files() > 0;
        let choices = current.nr_folders() + usize::from(has_files);
        if choices == 0 {
            return Ok(Attempt::Rejected(Rejection::EmptyDirectory {
                folder_id: current.id().to_string(),
                path: segments.join("/"),
            }));
        }

        let draw = rng.random_range(0..choices);
        if has_files && draw == choices - 1 {
            let files = filter_nodes(current.nodes(), false, true)?;
            let file = files[rng.random_range(0..files.len())].clone();
            segments.push(file.name.clone());
            return Ok(Attempt::Accepted(Pick {
                file,
                path: segments.join("/"),
                trail,
            }));
        }

        let next = filter_nodes(current.nodes(), true, false)?[draw].clone();
        debug!("descend into '{}'", next.name);
        current = match cache.get_named(&next.id, &next.name, false).await {
            Ok(folder) => folder,
            Err(e) if e.is_not_found() => {
                return Ok(Attempt::Rejected(Rejection::StaleReference {
                    id: next.id,
                    trail,
                }))
            }
            Err(e) => return Err(e),
        };
        segments.push(current.name().to_string());
        trail.push(current.id().to_string());
    }

    Err(DrivepickError::TreeTooDeep {
        id: current.id().to_string(),
        max_depth: MAX_DEPTH,
    })
}
