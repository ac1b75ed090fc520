//! ArduinoOTA listener
//!
//! Waits for espota invitations on UDP, authenticates the uploader when a
//! password is configured, then pulls the image over TCP from the uploader.

use core::fmt::Write as _;

use embassy_net::tcp::TcpSocket;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::with_timeout;
use embedded_io_async::Write;
use heapless::String;
use log::{debug, info, warn};
use sunrise_core::ota::{AuthReply, OTA_PORT, OtaAuth, OtaError, OtaInvitation};

use crate::config::OTA;
use crate::controllers::OtaController;
use crate::infrastructure::drivers::nonce_seed;
use crate::infrastructure::services::reboot;

/// Largest TCP segment the uploader sends
const CHUNK_SIZE: usize = 1460;
const AUTH_OK: &[u8] = b"OK";
const AUTH_FAILED: &[u8] = b"Authentication Failed";

#[embassy_executor::task]
pub async fn ota_listener_task(stack: Stack<'static>, mut controller: OtaController) {
    let auth = (!OTA.password.is_empty()).then(|| OtaAuth::new(OTA.password));

    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; 512];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0u8; 512];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    if let Err(e) = socket.bind(OTA_PORT) {
        warn!("ota: failed to bind port {}: {:?}", OTA_PORT, e);
        return;
    }
    info!("ota: listening on port {}", OTA_PORT);

    let mut packet = [0u8; 256];
    loop {
        let (len, meta) = match socket.recv_from(&mut packet).await {
            Ok(received) => received,
            Err(e) => {
                debug!("ota: recv error: {:?}", e);
                continue;
            }
        };
        let Some(invitation) = OtaInvitation::parse(&packet[..len]) else {
            debug!("ota: ignoring malformed invitation");
            continue;
        };
        let uploader = meta.endpoint;
        info!(
            "ota: invitation from {} for {} bytes",
            uploader.addr, invitation.size
        );

        let accepted = match &auth {
            Some(auth) => authenticate(&mut socket, uploader, auth, &mut packet).await,
            None => socket.send_to(AUTH_OK, uploader).await.is_ok(),
        };
        if !accepted {
            controller.fail(OtaError::Auth);
            continue;
        }

        if let Err(e) = controller.start(&invitation) {
            controller.fail(e);
            continue;
        }

        let image_source = IpEndpoint::new(uploader.addr, invitation.port);
        match receive_image(stack, image_source, &mut controller).await {
            Ok(()) => reboot(),
            Err(e) => controller.fail(e),
        }
    }
}

/// Challenge the uploader with a fresh nonce and check its answer.
async fn authenticate(
    socket: &mut UdpSocket<'_>,
    uploader: IpEndpoint,
    auth: &OtaAuth,
    buffer: &mut [u8],
) -> bool {
    let nonce = OtaAuth::nonce(&nonce_seed());
    let mut challenge: String<40> = String::new();
    if write!(challenge, "AUTH {}", nonce).is_err()
        || socket.send_to(challenge.as_bytes(), uploader).await.is_err()
    {
        return false;
    }

    let reply = loop {
        match with_timeout(OTA.receive_timeout, socket.recv_from(buffer)).await {
            Ok(Ok((len, meta))) if meta.endpoint.addr == uploader.addr => {
                break AuthReply::parse(&buffer[..len]);
            }
            // Datagrams from other hosts do not count as an answer.
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => {
                warn!("ota: no authentication reply");
                return false;
            }
        }
    };

    let accepted = reply.is_some_and(|reply| auth.verify(&nonce, &reply));
    let answer = if accepted { AUTH_OK } else { AUTH_FAILED };
    if socket.send_to(answer, uploader).await.is_err() {
        return false;
    }
    accepted
}

/// Connect back to the uploader and stream the image into flash.
async fn receive_image(
    stack: Stack<'static>,
    source: IpEndpoint,
    controller: &mut OtaController,
) -> Result<(), OtaError> {
    let mut rx_buffer = [0u8; CHUNK_SIZE * 2];
    let mut tx_buffer = [0u8; 128];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(OTA.receive_timeout));

    match with_timeout(OTA.receive_timeout, socket.connect(source)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!("ota: connect to {} failed: {:?}", source, e);
            return Err(OtaError::Connect);
        }
        Err(_) => return Err(OtaError::Connect),
    }

    let mut chunk = [0u8; CHUNK_SIZE];
    let mut ack: String<8> = String::new();
    while !controller.is_complete() {
        let len = match with_timeout(OTA.receive_timeout, socket.read(&mut chunk)).await {
            Ok(Ok(len)) if len > 0 => len,
            Ok(Ok(_)) => {
                warn!("ota: uploader closed the connection early");
                return Err(OtaError::Receive);
            }
            Ok(Err(e)) => {
                warn!("ota: read error: {:?}", e);
                return Err(OtaError::Receive);
            }
            Err(_) => {
                warn!("ota: receive timeout");
                return Err(OtaError::Receive);
            }
        };

        controller.write_chunk(&chunk[..len])?;

        ack.clear();
        write!(ack, "{}", len).map_err(|_| OtaError::Receive)?;
        socket
            .write_all(ack.as_bytes())
            .await
            .map_err(|_| OtaError::Receive)?;
    }

    let result = controller.finish();
    let reply = match result {
        Ok(()) => "OK",
        Err(e) => e.as_str(),
    };
    socket.write_all(reply.as_bytes()).await.ok();
    socket.flush().await.ok();
    socket.close();
    result
}
