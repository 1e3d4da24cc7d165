//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  The Wayfarer Developers
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Pre-answered consent cookie for Google travel pages.
//!
//! Without it Google Flights/Hotels answer with `consent.google.com` instead
//! of results. The SOCS value is a tiny protobuf: field 2 names a consent
//! frontend build (dated the day before the request), field 3 is an opaque
//! 5-byte blob browsers send.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{Local, NaiveDate};

const SOCS_BLOB: [u8; 5] = [0x08, 0x80, 0xc4, 0xf6, 0xca];

/// Protobuf length-delimited field: tag, varint length, payload
fn length_delimited(field: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![(field << 3) | 2];
    let mut len = payload.len();
    while len > 0x7f {
        out.push((len as u8 & 0x7f) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(payload);
    out
}

/// SOCS value (base64, no `SOCS=` prefix) for a request made on `today`
pub fn socs_value(today: NaiveDate) -> String {
    let build_day = today.pred_opt().unwrap_or(today);
    let build = format!(
        "boq_identityfrontenduiserver_{}.03_p0en",
        build_day.format("%Y%m%d")
    );
    let mut proto = length_delimited(2, build.as_bytes());
    proto.extend(length_delimited(3, &SOCS_BLOB));
    STANDARD.encode(proto)
}

/// `Cookie` header value accepted by both Flights and Hotels
pub fn consent_cookie_header() -> String {
    format!(
        "CONSENT=PENDING+987; SOCS={}",
        socs_value(Local::now().date_naive())
    )
}

/// True when a fetched page is the consent interstitial rather than content
pub fn is_consent_wall(body: &str) -> bool {
    body.contains("consent.google.com") || body.contains("ppConfig")
}
