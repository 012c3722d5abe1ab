use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

struct TlsPaths {
    cert_path: PathBuf,
    key_path: PathBuf,
}

pub struct StaticServer {
    address: SocketAddr,
    static_dir: PathBuf,
    tls: Option<TlsPaths>,
}

impl StaticServer {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let address: SocketAddr = settings.http.address.parse()?;
        let static_dir = PathBuf::from(&settings.http.static_dir);
        check_static_dir(&static_dir)?;

        let tls = match (&settings.http.cert_path, &settings.http.key_path) {
            (Some(cert_path), Some(key_path)) => {
                if !std::fs::metadata(cert_path)?.is_file() {
                    return Err(anyhow::anyhow!(
                        "TLS cert is not a regular file: {:?}",
                        cert_path
                    ));
                }
                if !std::fs::metadata(key_path)?.is_file() {
                    return Err(anyhow::anyhow!(
                        "TLS key is not a regular file: {:?}",
                        key_path
                    ));
                }
                Some(TlsPaths {
                    cert_path: cert_path.into(),
                    key_path: key_path.into(),
                })
            }
            (None, None) => None,
            _ => {
                return Err(anyhow::anyhow!(
                    "cert_path and key_path must be set together"
                ));
            }
        };

        Ok(Self {
            address,
            static_dir,
            tls,
        })
    }

    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) {
        let routes = spa_routes(self.static_dir.clone());

        match self.tls {
            Some(tls) => {
                info!("serving {:?} on https://{}", self.static_dir, self.address);
                warp::serve(routes)
                    .tls()
                    .cert_path(tls.cert_path)
                    .key_path(tls.key_path)
                    .bind_with_graceful_shutdown(self.address, shutdown)
                    .1
                    .await;
            }
            None => {
                info!("serving {:?} on http://{}", self.static_dir, self.address);
                warp::serve(routes)
                    .bind_with_graceful_shutdown(self.address, shutdown)
                    .1
                    .await;
            }
        }

        info!("static server stopped");
    }
}
