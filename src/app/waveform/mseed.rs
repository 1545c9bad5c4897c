//! miniSEED record header scanning
//!
//! Only the fixed section of each data record header and blockette 1000
//! are read: enough to place every record in time and measure how much of
//! a window a channel covers. Sample payloads are never decoded.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::app::models::TimeWindow;
use crate::errors::{DownloadError, DownloadResult};

const FIXED_HEADER_LEN: usize = 48;
const BLOCKETTE_1000: u16 = 1000;

/// Time placement of one data record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordSpan {
    pub start: DateTime<Utc>,
    pub sample_count: u16,
    pub sample_rate: f64,
}

impl RecordSpan {
    /// Time just after the last sample of the record
    pub fn end(&self) -> DateTime<Utc> {
        if self.sample_rate <= 0.0 {
            return self.start;
        }
        let micros = (f64::from(self.sample_count) / self.sample_rate * 1e6).round() as i64;
        self.start + Duration::microseconds(micros)
    }

    fn sample_period_micros(&self) -> i64 {
        if self.sample_rate <= 0.0 {
            0
        } else {
            (1e6 / self.sample_rate).round() as i64
        }
    }
}

/// How much of a window a channel's records cover
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub covered_secs: f64,
    pub window_secs: f64,
    pub gaps: usize,
}

impl Coverage {
    /// Covered fraction of the window, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.window_secs <= 0.0 {
            return 0.0;
        }
        (self.covered_secs / self.window_secs).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy)]
enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    fn u16(self, bytes: &[u8], offset: usize) -> u16 {
        let pair = [bytes[offset], bytes[offset + 1]];
        match self {
            ByteOrder::Big => u16::from_be_bytes(pair),
            ByteOrder::Little => u16::from_le_bytes(pair),
        }
    }

    fn i16(self, bytes: &[u8], offset: usize) -> i16 {
        self.u16(bytes, offset) as i16
    }

    /// Header byte order, detected from a plausible start year
    fn detect(header: &[u8]) -> Option<Self> {
        let plausible = |year: u16| (1900..=2100).contains(&year);
        if plausible(ByteOrder::Big.u16(header, 20)) {
            Some(ByteOrder::Big)
        } else if plausible(ByteOrder::Little.u16(header, 20)) {
            Some(ByteOrder::Little)
        } else {
            None
        }
    }
}

/// Read the time placement of every record in a miniSEED stream
///
/// # Errors
///
/// Returns `DownloadError::InvalidWaveform` when a header cannot be read or
/// a record lacks blockette 1000.
pub fn scan_records(data: &[u8]) -> DownloadResult<Vec<RecordSpan>> {
    let mut spans = Vec::new();
    let mut offset = 0;

    while offset + FIXED_HEADER_LEN <= data.len() {
        let record = &data[offset..];
        let order = ByteOrder::detect(record).ok_or_else(|| invalid(offset, "unreadable start time"))?;

        let record_len = record_length(record, order).ok_or_else(|| invalid(offset, "missing blockette 1000"))?;
        if record_len < FIXED_HEADER_LEN {
            return Err(invalid(offset, "record shorter than its header"));
        }

        let start = start_time(record, order).ok_or_else(|| invalid(offset, "invalid start time"))?;
        let sample_rate = sample_rate(order.i16(record, 32), order.i16(record, 34));
        spans.push(RecordSpan {
            start,
            sample_count: order.u16(record, 30),
            sample_rate,
        });

        offset += record_len;
    }

    Ok(spans)
}

/// Measure the coverage of `window` by a set of records
///
/// Records are merged into continuous segments when the next one starts
/// within half a sample period of the previous end. Every break between
/// segments inside the window counts as one gap.
pub fn coverage(spans: &[RecordSpan], window: &TimeWindow) -> Coverage {
    let mut data: Vec<&RecordSpan> = spans
        .iter()
        .filter(|s| s.sample_rate > 0.0 && s.sample_count > 0)
        .collect();
    data.sort_by_key(|s| s.start);

    let mut segments: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for span in data {
        let tolerance = Duration::microseconds(span.sample_period_micros() / 2);
        match segments.last_mut() {
            Some((_, end)) if span.start <= *end + tolerance => {
                if span.end() > *end {
                    *end = span.end();
                }
            }
            _ => segments.push((span.start, span.end())),
        }
    }

    let clipped: Vec<(DateTime<Utc>, DateTime<Utc>)> = segments
        .into_iter()
        .map(|(start, end)| (start.max(window.start), end.min(window.end)))
        .filter(|(start, end)| start < end)
        .collect();

    let covered_micros: i64 = clipped
        .iter()
        .map(|(start, end)| (*end - *start).num_microseconds().unwrap_or(0))
        .sum();

    Coverage {
        covered_secs: covered_micros as f64 / 1e6,
        window_secs: window.duration_secs(),
        gaps: clipped.len().saturating_sub(1),
    }
}

fn invalid(offset: usize, reason: &str) -> DownloadError {
    DownloadError::InvalidWaveform(format!("record at byte {}: {}", offset, reason))
}

fn record_length(record: &[u8], order: ByteOrder) -> Option<usize> {
    let mut next = usize::from(order.u16(record, 46));
    // Blockettes chain forward inside the header; a bounded walk avoids loops
    for _ in 0..16 {
        if next == 0 || next + 8 > record.len() {
            return None;
        }
        if order.u16(record, next) == BLOCKETTE_1000 {
            let exponent = u32::from(record[next + 6]);
            return 2_usize.checked_pow(exponent);
        }
        next = usize::from(order.u16(record, next + 2));
    }
    None
}

fn start_time(record: &[u8], order: ByteOrder) -> Option<DateTime<Utc>> {
    let year = i32::from(order.u16(record, 20));
    let day_of_year = u32::from(order.u16(record, 22));
    let (hour, minute, second) = (record[24], record[25], record[26]);
    let ten_thousandths = i64::from(order.u16(record, 28));

    let date = NaiveDate::from_yo_opt(year, day_of_year)?;
    // Leap seconds are reported as second 60
    let base = date.and_hms_opt(u32::from(hour), u32::from(minute), 0)?;
    Some(
        Utc.from_utc_datetime(&base)
            + Duration::seconds(i64::from(second))
            + Duration::microseconds(ten_thousandths * 100),
    )
}

fn sample_rate(factor: i16, multiplier: i16) -> f64 {
    let multiplier = if multiplier == 0 { 1 } else { multiplier };
    let (f, m) = (f64::from(factor), f64::from(multiplier));
    match (factor > 0, multiplier > 0) {
        _ if factor == 0 => 0.0,
        (true, true) => f * m,
        (true, false) => -f / m,
        (false, true) => -m / f,
        (false, false) => 1.0 / (f * m),
    }
}
