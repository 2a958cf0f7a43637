use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};
use url::Url;

pub struct OneShotServer {
    pub url: Url,
    /// Request head as received, resolved once the response is sent.
    pub request: oneshot::Receiver<String>,
}

/// Answer exactly one http request on a local port with `status` and a json `body`.
pub async fn serve_once(status: &'static str, body: &'static str) -> OneShotServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
    });

    OneShotServer {
        url: Url::parse(&format!("http://{addr}/apis/offers.php")).unwrap(),
        request: rx,
    }
}
