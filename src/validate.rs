// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Structural validation of emitted codestreams: cheap named checks a
//! caller can run on any blob before handing it to a decoder.

use crate::headers::image_header::{CODESTREAM_SIGNATURE, IMAGE_HEADER_SIZE};

/// Outcome of one named structural check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCheck {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl ValidationCheck {
    fn new(name: &'static str, passed: bool, message: impl Into<String>) -> ValidationCheck {
        ValidationCheck {
            name,
            passed,
            message: message.into(),
        }
    }
}

const MIN_CODESTREAM_SIZE: usize = 10;
const VALID_BITS_PER_SAMPLE: [u8; 5] = [8, 10, 12, 16, 32];

/// Runs every structural check on a codestream blob.
pub fn validate_codestream(data: &[u8]) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    checks.push(ValidationCheck::new(
        "minimum_size",
        data.len() >= MIN_CODESTREAM_SIZE,
        format!("{} bytes, minimum {MIN_CODESTREAM_SIZE}", data.len()),
    ));

    let has_signature = data.len() >= 2 && data[..2] == CODESTREAM_SIGNATURE;
    checks.push(ValidationCheck::new(
        "jxl_signature",
        has_signature,
        if has_signature {
            "signature ff0a present".to_string()
        } else {
            "signature bytes missing".to_string()
        },
    ));

    checks.push(ValidationCheck::new(
        "header_present",
        data.len() >= IMAGE_HEADER_SIZE,
        format!("{} bytes, header needs {IMAGE_HEADER_SIZE}", data.len()),
    ));

    let has_content = data.len() > 2 && data[2..].iter().any(|&byte| byte != 0);
    checks.push(ValidationCheck::new(
        "non_empty_content",
        has_content,
        if has_content {
            "payload bytes present".to_string()
        } else {
            "no non-zero payload after the signature".to_string()
        },
    ));

    checks.push(ValidationCheck::new(
        "reasonable_size",
        data.len() >= MIN_CODESTREAM_SIZE,
        format!("{} bytes", data.len()),
    ));

    if data.len() >= IMAGE_HEADER_SIZE {
        let bits = data[10];
        let channels = data[11];
        let bits_ok = VALID_BITS_PER_SAMPLE.contains(&bits);
        let channels_ok = (1..=4).contains(&channels);
        checks.push(ValidationCheck::new(
            "valid_header",
            bits_ok && channels_ok,
            format!("bits_per_sample {bits}, channels {channels}"),
        ));
    } else {
        checks.push(ValidationCheck::new(
            "valid_header",
            false,
            "header too short to inspect".to_string(),
        ));
    }

    checks
}

/// Aggregated validation result, with an optional external-decoder
/// corroboration supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub checks: Vec<ValidationCheck>,
    pub external_decoder_ok: Option<bool>,
}

impl ValidationReport {
    pub fn new(data: &[u8]) -> ValidationReport {
        ValidationReport {
            checks: validate_codestream(data),
            external_decoder_ok: None,
        }
    }

    /// Records whether an external reference decoder accepted the stream.
    pub fn with_external_result(mut self, ok: bool) -> ValidationReport {
        self.external_decoder_ok = Some(ok);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed) && self.external_decoder_ok != Some(false)
    }

    pub fn failed_checks(&self) -> Vec<&ValidationCheck> {
        self.checks.iter().filter(|check| !check.passed).collect()
    }
}
