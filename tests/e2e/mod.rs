// End-to-end tests for the ReadAloud Backend HTTP API
//
// Each test starts the real router on an ephemeral port with a mock speech
// engine and a temporary audio directory, then drives it over HTTP the way a
// polling client would: submit, poll status, download audio.

mod helpers;
mod test_synthesis;
