//! Listing payloads.
//!
//! A listing is a canonical CBOR map with a single key, the schema's
//! listing field, whose value is the array of stored records in index
//! order. Record payloads are spliced into the array as stored, so a
//! listing never re-encodes a record.

use crate::config::EmptyEntryPolicy;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::schema::RecordSchema;
use bytes::Bytes;
use freightdb_codec::{from_cbor, CanonicalEncoder};
use freightdb_state::StateBackend;
use tracing::warn;

/// Collects the payloads of `ids` into a listing.
pub(crate) fn build_listing(
    backend: &dyn StateBackend,
    schema: &RecordSchema,
    ids: &[String],
    policy: EmptyEntryPolicy,
) -> CoreResult<Bytes> {
    let mut payloads = Vec::with_capacity(ids.len());
    for id in ids {
        match backend.get(id)? {
            Some(bytes) if !bytes.is_empty() => {
                // spliced items must be records of this schema under their own key
                Record::decode_stored(schema, id, &bytes)?;
                payloads.push(bytes);
            }
            _ => match policy {
                EmptyEntryPolicy::Skip => {
                    warn!(%id, "skipping indexed id without a record");
                }
                EmptyEntryPolicy::Reject => {
                    return Err(CoreError::invalid_payload(format!(
                        "indexed {} {id} has no record",
                        schema.name()
                    )));
                }
            },
        }
    }

    let capacity = payloads.iter().map(Vec::len).sum::<usize>() + schema.listing_field().len() + 16;
    let mut encoder = CanonicalEncoder::with_capacity(capacity);
    encoder.map_header(1);
    encoder.text(schema.listing_field());
    encoder.array_header(payloads.len());
    for payload in &payloads {
        encoder.raw(payload);
    }
    Ok(Bytes::from(encoder.into_bytes()))
}

/// Decodes a listing payload back into records.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPayload`] if the payload is not a single-key
/// map holding an array of records of `schema`.
pub fn decode_listing(schema: &RecordSchema, bytes: &[u8]) -> CoreResult<Vec<Record>> {
    let mut pairs = from_cbor(bytes)?
        .into_map()
        .ok_or_else(|| CoreError::invalid_payload("listing is not a map"))?;
    if pairs.len() != 1 || pairs[0].0 != schema.listing_field() {
        return Err(CoreError::invalid_payload(format!(
            "listing must hold exactly the {:?} field",
            schema.listing_field()
        )));
    }
    let (_, items) = pairs.remove(0);
    items
        .into_array()
        .ok_or_else(|| CoreError::invalid_payload("listing field is not an array"))?
        .into_iter()
        .map(|item| Record::from_value(schema, item))
        .collect()
}
