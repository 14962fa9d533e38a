//! Walks the selection handshake end to end against a simulated peer.
//!
//! A real application hands the request receiver to a transport layer and
//! pumps decoded events off the compositor socket; here the peer lives
//! in-process so the demo runs anywhere. Run with
//! `RUST_LOG=trace cargo run --example paste` to watch the lifecycle.

use std::io::{Read, Write};
use std::os::fd::OwnedFd;

use kenai_core::channel::{Arg, Channel, EventMessage, RequestReceiver};
use kenai_core::dispatch::EventRegistry;
use kenai_protocol::data_offer::DataOffer;

/// Server-range id, as a compositor would pick for an announced offer.
const OFFER_ID: u32 = 0xff00_0001;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (channel, mut requests) = Channel::new();
    let mut registry = EventRegistry::new();

    // The peer announces a selection offer: wrap and register the handle,
    // then pump the offer events that follow right behind the announcement.
    let offer = DataOffer::from_raw(&channel, OFFER_ID).expect("peer announced a live offer");
    let offer_id = registry.register(offer).expect("offer id is unbound");
    for mime in ["text/plain;charset=utf-8", "text/plain", "text/uri-list"] {
        registry
            .dispatch(EventMessage {
                object: offer_id,
                opcode: 0,
                args: vec![Arg::Str(mime.to_owned())],
            })
            .expect("offer event dispatches");
    }

    let offer = registry.get::<DataOffer>(offer_id).expect("offer is registered");
    println!("offered formats:");
    for mime in offer.mime_types() {
        println!("  {mime}");
    }

    // Pick a format and hand the peer the write end of a pipe.
    let (mut reader, writer) = std::io::pipe().expect("pipe");
    offer
        .receive("text/plain", OwnedFd::from(writer))
        .expect("transport is live");

    // Done negotiating; the destructor request joins the queue.
    registry.release(offer_id);

    serve_peer(&mut requests);

    let mut payload = String::new();
    reader
        .read_to_string(&mut payload)
        .expect("peer closed its end of the pipe");
    println!("received: {payload}");
}

/// Drains the request queue the way the compositor side would.
fn serve_peer(requests: &mut RequestReceiver) {
    while let Ok(request) = requests.try_recv() {
        tracing::debug!(
            sender = request.sender,
            opcode = request.opcode,
            "peer received request"
        );

        // wl_data_offer.receive: stream the payload into the submitted fd.
        if request.opcode == 1 {
            let mut args = request.args.into_iter();
            let (Some(Arg::Str(mime)), Some(Arg::Fd(fd))) = (args.next(), args.next()) else {
                continue;
            };
            std::fs::File::from(fd)
                .write_all(format!("payload for {mime}").as_bytes())
                .expect("payload written");
        }
    }
}
