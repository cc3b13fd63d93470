use std::{
    fs::File,
    io::Cursor,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{error::AppResult, reader::SourceFiles};

/// Makes sure the ml-100k files exist under `data_dir`, downloading and
/// unpacking the archive only when they are not already there.
pub async fn ensure_dataset(
    client: &wreq::Client,
    url: &str,
    data_dir: &Path,
) -> AppResult<SourceFiles> {
    let stem = archive_stem(url)?;
    let archive = data_dir.join(format!("{stem}.zip"));
    let extracted = data_dir.join(&stem);

    std::fs::create_dir_all(data_dir)?;

    if archive.exists() {
        debug!(path = %archive.display(), "archive already downloaded");
    } else {
        download(client, url, &archive).await?;
    }

    if extracted.exists() {
        debug!(path = %extracted.display(), "archive already extracted");
    } else {
        let archive = archive.clone();
        let target = data_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract(&archive, &target))
            .await
            .map_err(anyhow::Error::new)??;
        info!(path = %extracted.display(), "extracted dataset");
    }

    Ok(SourceFiles::in_dir(&extracted))
}

async fn download(client: &wreq::Client, url: &str, dest: &Path) -> AppResult<()> {
    info!(url = %url, "downloading dataset");

    let bytes = client.get(url).send().await?.error_for_status()?.bytes().await?;

    let partial = dest.with_extension("zip.part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, dest).await?;

    info!(path = %dest.display(), bytes = bytes.len(), "downloaded dataset");
    Ok(())
}

/// Unpacks every entry of `archive` below `target`, skipping entries whose
/// names would land outside of it.
pub fn extract(archive: &Path, target: &Path) -> AppResult<Vec<PathBuf>> {
    let bytes = std::fs::read(archive)?;
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = Vec::with_capacity(zip.len());

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            debug!(entry = %entry.name(), "skipping entry outside target directory");
            continue;
        };
        let out = target.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&out)?;
        std::io::copy(&mut entry, &mut file)?;
        written.push(out);
    }

    debug!(archive = %archive.display(), files = written.len(), "unpacked archive");
    Ok(written)
}

fn archive_stem(url: &str) -> AppResult<String> {
    let name = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let stem = name.strip_suffix(".zip").unwrap_or(name);
    if stem.is_empty() {
        return Err(anyhow::anyhow!("cannot derive archive name from {url}").into());
    }
    Ok(stem.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    #[test]
    fn archive_stem_from_url() {
        let stem =
            archive_stem("http://files.grouplens.org/datasets/movielens/ml-100k.zip").unwrap();
        assert_eq!(stem, "ml-100k");
        assert!(archive_stem("http://host/").is_err());
    }

    #[test]
    fn extracts_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("ml-100k.zip");

        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer.add_directory("ml-100k/", SimpleFileOptions::default()).unwrap();
        writer.start_file("ml-100k/u.user", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"1|24|M|technician|85711\n").unwrap();
        writer.finish().unwrap();

        let target = dir.path().join("data");
        let written = extract(&archive, &target).unwrap();

        assert_eq!(written, vec![target.join("ml-100k/u.user")]);
        assert_eq!(
            std::fs::read_to_string(target.join("ml-100k/u.user")).unwrap(),
            "1|24|M|technician|85711\n"
        );
    }

    #[tokio::test]
    async fn existing_dataset_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ml-100k.zip"), b"").unwrap();
        std::fs::create_dir_all(dir.path().join("ml-100k")).unwrap();

        let client = wreq::Client::new();
        let files = ensure_dataset(&client, "http://127.0.0.1:9/ml-100k.zip", dir.path())
            .await
            .unwrap();

        assert_eq!(files.movies, dir.path().join("ml-100k/u.item"));
        assert_eq!(files.ratings, dir.path().join("ml-100k/u.data"));
    }
}
