//! Shared fixtures for the acquisition integration tests

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use seismic_fetcher::app::ClientConfig;

/// One station of a StationXML fixture
pub struct StationRows<'a> {
    pub network: &'a str,
    pub station: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub channels: &'a [&'a str],
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, d).unwrap()
}

/// Fast client settings: no retries, generous rate limit
pub fn client_config() -> ClientConfig {
    ClientConfig {
        max_retries: 0,
        retry_base_delay: Duration::from_millis(1),
        rate_limit_rps: 1000,
        ..Default::default()
    }
}

/// Response-level StationXML document listing `stations`, one network
/// element per station
pub fn station_xml(stations: &[StationRows<'_>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<FDSNStationXML xmlns="http://www.fdsn.org/xml/station/1" schemaVersion="1.1">
  <Source>Mock</Source>
  <Created>2012-06-01T00:00:00</Created>
"#,
    );
    for station in stations {
        xml.push_str(&format!(
            r#"  <Network code="{net}">
    <Station code="{sta}" startDate="2008-01-01T00:00:00">
      <Latitude>{lat}</Latitude>
      <Longitude>{lon}</Longitude>
      <Elevation>250.0</Elevation>
      <Site><Name>{sta}</Name></Site>
"#,
            net = station.network,
            sta = station.station,
            lat = station.latitude,
            lon = station.longitude,
        ));
        for channel in station.channels {
            xml.push_str(&format!(
                r#"      <Channel code="{channel}" locationCode="" startDate="2008-01-01T00:00:00">
        <Latitude>{lat}</Latitude>
        <Longitude>{lon}</Longitude>
        <Elevation>250.0</Elevation>
        <Depth>0.0</Depth>
        <SampleRate>100.0</SampleRate>
        <Sensor><Description>Trillium 120P</Description></Sensor>
        <Response>
          <InstrumentSensitivity>
            <Value>600000000.0</Value>
            <Frequency>1.0</Frequency>
            <InputUnits><Name>M/S</Name></InputUnits>
            <OutputUnits><Name>COUNTS</Name></OutputUnits>
          </InstrumentSensitivity>
          <Stage number="1">
            <PolesZeros>
              <InputUnits><Name>M/S</Name></InputUnits>
              <OutputUnits><Name>V</Name></OutputUnits>
              <PzTransferFunctionType>LAPLACE (RADIANS/SECOND)</PzTransferFunctionType>
              <NormalizationFactor>1.0</NormalizationFactor>
              <NormalizationFrequency>1.0</NormalizationFrequency>
              <Zero number="0"><Real>0.0</Real><Imaginary>0.0</Imaginary></Zero>
              <Pole number="0"><Real>-0.037</Real><Imaginary>0.037</Imaginary></Pole>
            </PolesZeros>
            <StageGain><Value>1201.0</Value><Frequency>1.0</Frequency></StageGain>
          </Stage>
        </Response>
      </Channel>
"#,
                channel = channel,
                lat = station.latitude,
                lon = station.longitude,
            ));
        }
        xml.push_str("    </Station>\n  </Network>\n");
    }
    xml.push_str("</FDSNStationXML>\n");
    xml
}

/// One 512-byte big-endian miniSEED record header with blockette 1000
fn record(start: DateTime<Utc>, sample_count: u16, rate: i16) -> Vec<u8> {
    let mut bytes = vec![0u8; 512];
    bytes[0..6].copy_from_slice(b"000001");
    bytes[6] = b'D';
    bytes[8..13].copy_from_slice(b"SANT ");
    bytes[15..18].copy_from_slice(b"HHZ");
    bytes[18..20].copy_from_slice(b"HL");
    bytes[20..22].copy_from_slice(&(start.year() as u16).to_be_bytes());
    bytes[22..24].copy_from_slice(&(start.ordinal() as u16).to_be_bytes());
    bytes[24] = start.hour() as u8;
    bytes[25] = start.minute() as u8;
    bytes[26] = start.second() as u8;
    bytes[30..32].copy_from_slice(&sample_count.to_be_bytes());
    bytes[32..34].copy_from_slice(&rate.to_be_bytes());
    bytes[34..36].copy_from_slice(&1i16.to_be_bytes());
    bytes[39] = 1;
    bytes[44..46].copy_from_slice(&64u16.to_be_bytes());
    bytes[46..48].copy_from_slice(&48u16.to_be_bytes());
    bytes[48..50].copy_from_slice(&1000u16.to_be_bytes());
    bytes[52] = 11;
    bytes[53] = 1;
    bytes[54] = 9;
    bytes
}

/// A gap-free 1 Hz stream covering the whole of `day` in two records
pub fn full_day_stream(day: NaiveDate) -> Vec<u8> {
    let midnight = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let mut data = record(midnight, 43_200, 1);
    data.extend(record(midnight + chrono::Duration::hours(12), 43_200, 1));
    data
}

/// A gap-free 1 Hz stream of `seconds` samples starting at `start`
pub fn window_stream(start: DateTime<Utc>, seconds: u16) -> Vec<u8> {
    record(start, seconds, 1)
}

/// QuakeML catalog holding one located event with a preferred origin
pub fn quakeml_event(time: &str, latitude: f64, longitude: f64, depth_m: f64, magnitude: f64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<q:quakeml xmlns:q="http://quakeml.org/xmlns/quakeml/1.2" xmlns="http://quakeml.org/xmlns/bed/1.2">
  <eventParameters publicID="smi:org.gfz-potsdam.de/geofon/EMSC">
    <event publicID="smi:www.emsc-csem.org/event/20120601_0000100">
      <preferredOriginID>smi:www.emsc-csem.org/origin/1</preferredOriginID>
      <origin publicID="smi:www.emsc-csem.org/origin/1">
        <time><value>{time}</value></time>
        <latitude><value>{latitude}</value></latitude>
        <longitude><value>{longitude}</value></longitude>
        <depth><value>{depth_m}</value></depth>
        <methodID>smi:www.emsc-csem.org/method/hypo71</methodID>
        <evaluationMode>manual</evaluationMode>
        <creationInfo><agencyID>NOA</agencyID></creationInfo>
        <arrival publicID="smi:a/1"><pickID>smi:p/1</pickID><phase>P</phase></arrival>
        <arrival publicID="smi:a/2"><pickID>smi:p/2</pickID><phase>S</phase></arrival>
      </origin>
      <magnitude publicID="smi:www.emsc-csem.org/magnitude/1">
        <mag><value>{magnitude}</value></mag>
        <type>ML</type>
      </magnitude>
    </event>
  </eventParameters>
</q:quakeml>
"#
    )
}

/// A 1 Hz stream covering only the first hour of `day`
pub fn one_hour_stream(day: NaiveDate) -> Vec<u8> {
    let midnight = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    record(midnight, 3_600, 1)
}
