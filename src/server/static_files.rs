use std::path::{Path, PathBuf};
use warp::{Filter, Rejection, Reply};

pub const INDEX_FILE: &str = "index.html";

/// Serves the built single-page app from `static_dir`.
///
/// Paths that do not name a file fall back to `index.html` so that
/// client-side routes survive a page reload.
pub fn spa_routes(
    static_dir: impl Into<PathBuf>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let static_dir = static_dir.into();
    let index = static_dir.join(INDEX_FILE);

    warp::get()
        .and(warp::fs::dir(static_dir).or(warp::fs::file(index)).unify())
        .with(warp::trace::request())
}

pub fn check_static_dir(static_dir: &Path) -> anyhow::Result<()> {
    if !std::fs::metadata(static_dir)?.is_dir() {
        return Err(anyhow::anyhow!(
            "static dir is not a directory: {:?}",
            static_dir
        ));
    }
    if !std::fs::metadata(static_dir.join(INDEX_FILE))?.is_file() {
        return Err(anyhow::anyhow!(
            "static dir has no {}: {:?}",
            INDEX_FILE,
            static_dir
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "<html>walrus</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets").join("app.js"), "console.log(1)").unwrap();
        dir
    }

    #[tokio::test]
    async fn serves_existing_files() {
        let dir = site();
        let routes = spa_routes(dir.path().to_path_buf());

        let response = warp::test::request()
            .path("/assets/app.js")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(&response.body()[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_index() {
        let dir = site();
        let routes = spa_routes(dir.path().to_path_buf());

        let response = warp::test::request()
            .path("/layouts/42/graph")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(&response.body()[..], b"<html>walrus</html>");
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let dir = site();
        let routes = spa_routes(dir.path().to_path_buf());

        let response = warp::test::request()
            .method("POST")
            .path("/")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 405);
    }

    #[test]
    fn static_dir_needs_an_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_static_dir(dir.path()).is_err());
        std::fs::write(dir.path().join(INDEX_FILE), "").unwrap();
        assert!(check_static_dir(dir.path()).is_ok());
    }
}
