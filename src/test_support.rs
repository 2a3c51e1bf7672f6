//! Test PKI and an in-process gateway that requires client certificates

use base64::Engine;
use pkcs8::pkcs5::pbes2;
use pkcs8::PrivateKeyInfo;
use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use rustls_pki_types::PrivatePkcs8KeyDer;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Throwaway certificate authority
pub(crate) struct TestPki {
    ca_cert: Certificate,
    ca_key: KeyPair,
}

impl TestPki {
    pub(crate) fn new() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params
            .distinguished_name
            .push(DnType::CommonName, "pushgate test CA");
        let ca_cert = params.self_signed(&ca_key).unwrap();
        Self { ca_cert, ca_key }
    }

    /// Issue a leaf certificate for `name` signed by this CA
    pub(crate) fn issue(&self, name: &str) -> (Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        let cert = params
            .signed_by(&key, &self.ca_cert, &self.ca_key)
            .unwrap();
        (cert, key)
    }

    pub(crate) fn ca_pem(&self) -> String {
        self.ca_cert.pem()
    }

    pub(crate) fn root_store(&self) -> RootCertStore {
        let mut store = RootCertStore::empty();
        store.add(self.ca_cert.der().clone()).unwrap();
        store
    }
}

/// PEM-encode DER bytes with 64-column lines
pub(crate) fn pem_encode(label: &str, der: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(der);
    let mut out = format!("-----BEGIN {}-----\n", label);
    for line in encoded.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(line).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {}-----\n", label));
    out
}

/// `key` as a PBES2-encrypted PKCS#8 PEM block
pub(crate) fn encrypted_key_pem(key: &KeyPair, passphrase: &str) -> String {
    let der = key.serialize_der();
    let info = PrivateKeyInfo::try_from(der.as_slice()).unwrap();
    let salt = [7u8; 16];
    let iv = [9u8; 16];
    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, &salt, &iv).unwrap();
    let encrypted = info.encrypt_with_params(params, passphrase).unwrap();
    pem_encode("ENCRYPTED PRIVATE KEY", encrypted.as_bytes())
}

/// Write a client bundle issued by `pki` into `dir`
pub(crate) fn write_client_bundle(pki: &TestPki, dir: &tempfile::TempDir) -> PathBuf {
    let (cert, key) = pki.issue("pushgate-client");
    let path = dir.path().join("client.pem");
    std::fs::write(&path, format!("{}{}", cert.pem(), key.serialize_pem())).unwrap();
    path
}

/// What the test gateway does with a session after the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatewayMode {
    /// Echo every byte back
    Echo,
    /// Hold the session open and never read from it
    Stalled,
}

/// Gateway on 127.0.0.1 that demands a client certificate from `pki`
pub(crate) struct TestGateway {
    pub(crate) port: u16,
    accepted: Arc<AtomicUsize>,
    clean_eofs: Arc<AtomicUsize>,
}

impl TestGateway {
    pub(crate) async fn start(pki: &TestPki) -> Self {
        Self::start_with(pki, GatewayMode::Echo).await
    }

    pub(crate) async fn start_with(pki: &TestPki, mode: GatewayMode) -> Self {
        let verifier = WebPkiClientVerifier::builder(Arc::new(pki.root_store()))
            .build()
            .unwrap();
        let (cert, key) = pki.issue("localhost");
        let config = ServerConfig::builder()
            .with_client_cert_verifier(verifier)
            .with_single_cert(
                vec![cert.der().clone()],
                PrivatePkcs8KeyDer::from(key.serialize_der()).into(),
            )
            .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let clean_eofs = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        let eofs = clean_eofs.clone();

        tokio::spawn(async move {
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let acceptor = acceptor.clone();
                let eofs = eofs.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = acceptor.accept(tcp).await else {
                        return;
                    };
                    if mode == GatewayMode::Stalled {
                        std::future::pending::<()>().await;
                    }
                    let mut buf = [0u8; 4096];
                    loop {
                        match tls.read(&mut buf).await {
                            Ok(0) => {
                                eofs.fetch_add(1, Ordering::SeqCst);
                                break;
                            }
                            Err(_) => break,
                            Ok(n) => {
                                if tls.write_all(&buf[..n]).await.is_err() {
                                    break;
                                }
                                let _ = tls.flush().await;
                            }
                        }
                    }
                });
            }
        });

        Self {
            port,
            accepted,
            clean_eofs,
        }
    }

    /// TCP connections accepted so far
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Sessions that ended with a clean end of stream (read returned 0)
    pub(crate) fn clean_eofs(&self) -> usize {
        self.clean_eofs.load(Ordering::SeqCst)
    }
}
