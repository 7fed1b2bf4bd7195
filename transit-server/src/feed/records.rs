//! Raw CSV row shapes for the GTFS static files.
//!
//! These mirror the wire format; conversion into domain types (including
//! time parsing and id scoping) happens in the loader. Unknown columns are
//! ignored by the reader, and column order is irrelevant.

use serde::Deserialize;

/// Row of `stops.txt`.
#[derive(Debug, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub platform_code: Option<String>,
}

/// Row of `routes.txt`.
#[derive(Debug, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
    pub route_type: u16,
}

/// Row of `trips.txt`.
#[derive(Debug, Deserialize)]
pub struct TripRow {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub direction_id: Option<u8>,
}

/// Row of `stop_times.txt`.
#[derive(Debug, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

/// Row of `calendar.txt`. Weekday flags and dates stay as wire values here.
#[derive(Debug, Deserialize)]
pub struct CalendarRow {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    /// YYYYMMDD
    pub start_date: String,
    /// YYYYMMDD
    pub end_date: String,
}

impl CalendarRow {
    /// Weekday flags Monday-first.
    pub fn weekdays(&self) -> [bool; 7] {
        [
            self.monday != 0,
            self.tuesday != 0,
            self.wednesday != 0,
            self.thursday != 0,
            self.friday != 0,
            self.saturday != 0,
            self.sunday != 0,
        ]
    }
}

/// Row of `calendar_dates.txt`.
#[derive(Debug, Deserialize)]
pub struct CalendarDateRow {
    pub service_id: String,
    /// YYYYMMDD
    pub date: String,
    /// 1 = added, 2 = removed
    pub exception_type: u8,
}

/// Row of `transfers.txt`.
#[derive(Debug, Deserialize)]
pub struct TransferRow {
    pub from_stop_id: String,
    pub to_stop_id: String,
    #[serde(default)]
    pub transfer_type: u8,
    #[serde(default)]
    pub min_transfer_time: Option<u32>,
}

/// Row of `agency.txt`.
#[derive(Debug, Deserialize)]
pub struct AgencyRow {
    #[serde(default)]
    pub agency_id: Option<String>,
    pub agency_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_weekday_flags() {
        let row = CalendarRow {
            service_id: "WD".into(),
            monday: 1,
            tuesday: 1,
            wednesday: 1,
            thursday: 1,
            friday: 1,
            saturday: 0,
            sunday: 0,
            start_date: "20260101".into(),
            end_date: "20261231".into(),
        };
        assert_eq!(
            row.weekdays(),
            [true, true, true, true, true, false, false]
        );
    }

    #[test]
    fn rows_deserialize_from_csv() {
        let data = "stop_id,stop_name,stop_lat,stop_lon,extra\n47648,Tarneit Station,-37.83,144.69,x\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<StopRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stop_name, "Tarneit Station");
        assert!(rows[0].platform_code.is_none());
    }

    #[test]
    fn reordered_columns_are_accepted() {
        let data = "stop_lat,stop_id,stop_lon,stop_name\n-37.83,47648,144.69,Tarneit Station\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<StopRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].stop_id, "47648");
    }
}
