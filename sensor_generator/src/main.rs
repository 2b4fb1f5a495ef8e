use std::time::Duration;

use futures_util::SinkExt;
use rand::Rng;
use sensor_serial::codec::SensorLineCodec;
use sensor_serial::config::DEFAULT_BAUD_RATE;
use sensor_serial::port::detect_port;
use sensor_serial::SensorRecord;
use tokio::time::interval;
use tokio_util::codec::Decoder;
use tracing::debug;

/// One in this many lines is sent malformed.
const GARBLE_ONE_IN: u32 = 5;

fn random_record(rng: &mut impl Rng, second: u32) -> SensorRecord {
    let timestamp = format!(
        "{:02}:{:02}:{:02}",
        (second / 3600) % 24,
        (second / 60) % 60,
        second % 60
    );
    let heart_rate = rng.gen_range(55..130).to_string();
    let temperature = format!("{:.1}", rng.gen_range(35.5..38.0));
    let gsr = rng.gen_range(150..700).to_string();
    SensorRecord::new(&timestamp, &heart_rate, &temperature, &gsr)
}

/// Break a valid record in one of the ways a flaky link does.
fn garble(rng: &mut impl Rng, record: &SensorRecord) -> String {
    let [timestamp, heart_rate, temperature, gsr] = record.fields();
    match rng.gen_range(0..4) {
        0 => format!("{timestamp},,{temperature},{gsr}"),
        1 => format!("{timestamp},{heart_rate},{temperature}"),
        2 => format!("{record},extra"),
        _ => String::new(),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    eprintln!("Please insert your serial adapter now...");
    let mut interval = interval(Duration::from_secs(1));
    #[allow(unused_mut)]
    let mut port = detect_port(&mut interval, DEFAULT_BAUD_RATE)
        .await
        .expect("Failed to detect port");
    eprintln!("Acquired port!");
    #[cfg(unix)]
    port.set_exclusive(true).unwrap();

    let codec = SensorLineCodec::default();
    let mut line_port = codec.framed(port);

    let mut second = 0;
    loop {
        let record = random_record(&mut rand::thread_rng(), second);
        if rand::thread_rng().gen_ratio(1, GARBLE_ONE_IN) {
            let line = garble(&mut rand::thread_rng(), &record);
            debug!("Sending malformed line {line:?}");
            line_port.send(line).await.expect("Failed to send line");
        } else {
            debug!("Sending {record}");
            line_port.send(record).await.expect("Failed to send record");
        }
        second += 1;
        interval.tick().await;
    }
}
