/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Read;

use uuid::Uuid;

use crate::{
    soap::{Envelope, Header, ResponseReader},
    Error, ExchangeServerVersion, Operation, ProtocolError, ResponseOutcome, ServiceErrorHandling,
    ServiceResponses, Transport, TransportError, ValidationError,
};

/// Options to tweak the behaviour of a single call.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Whether to log the full request and response bodies. These may
    /// contain personal data, so this defaults to `false`.
    pub log_payloads: bool,

    /// The largest response body to accept, in bytes. `None` means no limit.
    pub max_response_size: Option<usize>,
}

/// Where a [`ServiceCall`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    NotStarted,
    Validating,
    Sending,

    /// Reading the response message at `index`.
    ReadingResponses { index: usize },

    Completed,
    Failed,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Completed | CallState::Failed)
    }
}

/// Collects the outcomes of response messages, in order, applying an
/// operation's [`ServiceErrorHandling`].
#[derive(Debug)]
pub struct ResponseCorrelator<T> {
    error_handling: ServiceErrorHandling,
    expected: usize,
    outcomes: Vec<ResponseOutcome<T>>,
    failed: bool,
}

impl<T> ResponseCorrelator<T> {
    pub fn new(error_handling: ServiceErrorHandling, expected: usize) -> Self {
        ResponseCorrelator {
            error_handling,
            expected,
            outcomes: Vec::with_capacity(expected),
            failed: false,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.outcomes.len()
    }

    /// The index of the next response message to read, or `None` if every
    /// expected message has been accepted or the correlator has failed.
    pub fn next_index(&self) -> Option<usize> {
        (!self.failed && self.outcomes.len() < self.expected).then_some(self.outcomes.len())
    }

    /// Accepts the outcome of the next response message.
    ///
    /// With [`ServiceErrorHandling::ThrowOnError`], an error outcome discards
    /// every outcome accepted so far and fails with
    /// [`Error::ResponseError`].
    pub fn accept(&mut self, outcome: ResponseOutcome<T>) -> Result<(), Error> {
        if self.failed {
            return Err(Error::InvalidCallState(CallState::Failed));
        }

        let index = self.outcomes.len();
        if index >= self.expected {
            return Err(ProtocolError::TooManyResponses {
                expected: self.expected,
            }
            .into());
        }

        match outcome {
            ResponseOutcome::Error(error)
                if self.error_handling == ServiceErrorHandling::ThrowOnError =>
            {
                self.outcomes.clear();
                self.failed = true;

                Err(Error::ResponseError { index, error })
            }

            outcome => {
                if let ResponseOutcome::Warning { warning, .. } = &outcome {
                    log::warn!("response message {index} carried a warning: {warning}");
                }

                self.outcomes.push(outcome);

                Ok(())
            }
        }
    }

    /// Returns the accepted outcomes, provided there are as many as
    /// expected.
    pub fn finish(self) -> Result<Vec<ResponseOutcome<T>>, Error> {
        if self.failed {
            return Err(Error::InvalidCallState(CallState::Failed));
        }

        if self.outcomes.len() < self.expected {
            return Err(ProtocolError::TooFewResponses {
                expected: self.expected,
                actual: self.outcomes.len(),
            }
            .into());
        }

        Ok(self.outcomes)
    }
}

/// One request/response exchange for an operation.
///
/// A call owns its operation and borrows the transport. It runs once: from
/// [`CallState::NotStarted`] to either [`CallState::Completed`] or
/// [`CallState::Failed`].
pub struct ServiceCall<'t, T, Op> {
    transport: &'t T,
    operation: Op,
    options: RequestOptions,
    state: CallState,
}

impl<'t, T, Op> ServiceCall<'t, T, Op>
where
    T: Transport,
    Op: Operation,
{
    pub fn new(transport: &'t T, operation: Op) -> Self {
        ServiceCall {
            transport,
            operation,
            options: RequestOptions::default(),
            state: CallState::NotStarted,
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn operation(&self) -> &Op {
        &self.operation
    }

    /// Validates, sends and reads the response to the operation.
    ///
    /// Nothing is sent if validation fails. Under
    /// [`ServiceErrorHandling::ReturnErrors`] the returned responses hold one
    /// outcome per expected response message, in request order.
    pub fn execute(&mut self) -> Result<ServiceResponses<Op::Message>, Error> {
        if self.state != CallState::NotStarted {
            return Err(Error::InvalidCallState(self.state));
        }

        let result = self.run();
        match &result {
            Ok(_) => self.transition(CallState::Completed),
            Err(err) => {
                log::debug!("{} call failed: {err}", Op::NAME);
                self.transition(CallState::Failed);
            }
        }

        result
    }

    fn run(&mut self) -> Result<ServiceResponses<Op::Message>, Error> {
        self.transition(CallState::Validating);
        let version = self.transport.negotiated_version();
        self.validate(version)?;

        self.transition(CallState::Sending);
        let envelope = Envelope {
            headers: vec![Header::RequestServerVersion { version }],
            body: &self.operation,
        }
        .as_xml_document()?;

        let request_id = Uuid::new_v4();
        log::info!("Making operation request {request_id}: {}", Op::NAME);
        if self.options.log_payloads {
            log::info!("C: {}", String::from_utf8_lossy(&envelope));
        }

        let reply = self.transport.send(&envelope)?;
        let body = self.read_reply(reply)?;

        log::info!(
            "Response received for request {request_id} ({} bytes)",
            body.len()
        );
        if self.options.log_payloads {
            log::info!("S: {}", String::from_utf8_lossy(&body));
        }

        let document = std::str::from_utf8(&body).map_err(ProtocolError::from)?;
        self.correlate(document)
    }

    /// Checks, in order, the operation's version requirement, its own
    /// parameters, and that it expects at least one response message.
    fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError> {
        if version < Op::MIN_SERVER_VERSION {
            return Err(ValidationError::UnsupportedServerVersion {
                operation: Op::NAME,
                required: Op::MIN_SERVER_VERSION,
                negotiated: version,
            });
        }

        self.operation.validate(version)?;

        if self.operation.expected_response_count() == 0 {
            return Err(ValidationError::NoResponseExpected {
                operation: Op::NAME,
            });
        }

        Ok(())
    }

    fn read_reply(&self, reply: T::Reply) -> Result<Vec<u8>, Error> {
        let mut body = Vec::new();

        match self.options.max_response_size {
            Some(limit) => {
                // Read one byte past the limit to tell an oversized response
                // from one of exactly the limit.
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                reply
                    .take(cap)
                    .read_to_end(&mut body)
                    .map_err(TransportError::from)?;

                if body.len() > limit {
                    return Err(ProtocolError::ResponseTooLarge { limit }.into());
                }
            }
            None => {
                let mut reply = reply;
                reply
                    .read_to_end(&mut body)
                    .map_err(TransportError::from)?;
            }
        }

        Ok(body)
    }

    fn correlate(&mut self, document: &str) -> Result<ServiceResponses<Op::Message>, Error> {
        let mut reader = ResponseReader::new(document);
        let server_version_info = reader.read_to_response(Op::RESPONSE_NAME)?;

        let mut correlator: ResponseCorrelator<Op::Message> = ResponseCorrelator::new(
            self.operation.error_handling(),
            self.operation.expected_response_count(),
        );

        while let Some(index) = correlator.next_index() {
            self.transition(CallState::ReadingResponses { index });

            match reader.next_message(Op::RESPONSE_MESSAGE_NAME, index)? {
                Some(outcome) => correlator.accept(outcome)?,
                None => break,
            }
        }

        let expected = correlator.expected();
        let outcomes = correlator.finish()?;
        reader.finish(Op::RESPONSE_MESSAGE_NAME, expected)?;

        Ok(ServiceResponses::new(outcomes, server_version_info))
    }

    fn transition(&mut self, state: CallState) {
        log::debug!("{} call: {:?} -> {:?}", Op::NAME, self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
mod test {
    use serde::Deserialize;

    use super::{CallState, RequestOptions, ResponseCorrelator, ServiceCall};
    use crate::{
        test_utils::{
            error_message, response_envelope, success_message, warning_message, MockTransport,
        },
        AttributeWriter, Error, ExchangeServerVersion, Operation, ProtocolError, ResponseClass,
        ResponseCode, ResponseError, ResponseOutcome, ServiceErrorHandling, ServiceXmlWriter,
        TransportError, ValidationError, XmlNamespace,
    };

    /// An operation with a configurable number of units, used to drive the
    /// call machinery without depending on a real operation's rules.
    struct Tally {
        units: Vec<&'static str>,
        error_handling: ServiceErrorHandling,
    }

    impl Tally {
        fn new(units: &[&'static str], error_handling: ServiceErrorHandling) -> Self {
            Tally {
                units: units.to_vec(),
                error_handling,
            }
        }
    }

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "PascalCase")]
    struct TallyResponseMessage {
        unit: Option<String>,
    }

    impl Operation for Tally {
        type Message = TallyResponseMessage;

        crate::macros::operation_names!(Tally);

        const MIN_SERVER_VERSION: ExchangeServerVersion = ExchangeServerVersion::Exchange2010;

        fn error_handling(&self) -> ServiceErrorHandling {
            self.error_handling
        }

        fn expected_response_count(&self) -> usize {
            self.units.len()
        }

        fn validate(&self, _version: ExchangeServerVersion) -> Result<(), ValidationError> {
            if self.units.contains(&"") {
                return Err(ValidationError::InvalidParameter {
                    name: "units",
                    reason: "must not be blank",
                });
            }

            Ok(())
        }

        fn write_attributes(&self, writer: &mut AttributeWriter<'_>) -> Result<(), Error> {
            writer.write_attribute_value("Strict", &true);

            Ok(())
        }

        fn write_elements(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
            writer.write_start_element(XmlNamespace::Messages, "Units")?;
            for unit in &self.units {
                writer.write_element_value(XmlNamespace::Types, "Unit", unit)?;
            }

            writer.write_end_element()
        }
    }

    fn unit_success(unit: &str) -> String {
        success_message("TallyResponseMessage", &format!("<m:Unit>{unit}</m:Unit>"))
    }

    fn unit_error(code: &str) -> String {
        error_message("TallyResponseMessage", code, "Unit failed.")
    }

    fn tally_reply(messages: &[String]) -> String {
        response_envelope("TallyResponse", messages)
    }

    fn unit(value: &str) -> ResponseOutcome<TallyResponseMessage> {
        ResponseOutcome::Success(TallyResponseMessage {
            unit: Some(value.to_string()),
        })
    }

    #[test]
    fn units_are_sent_and_answered_in_order() -> Result<(), Error> {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[unit_success("A"), unit_success("B"), unit_success("C")]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A", "B", "C"], ServiceErrorHandling::ReturnErrors),
        );
        let responses = call.execute()?;

        assert_eq!(call.state(), CallState::Completed);
        assert!(transport.last_request().contains(
            r#"<Tally xmlns="http://schemas.microsoft.com/exchange/services/2006/messages" Strict="true"><Units><t:Unit>A</t:Unit><t:Unit>B</t:Unit><t:Unit>C</t:Unit></Units></Tally>"#
        ));
        assert_eq!(
            responses.into_outcomes(),
            vec![unit("A"), unit("B"), unit("C")]
        );

        Ok(())
    }

    #[test]
    fn request_names_negotiated_version() -> Result<(), Error> {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2010_SP2,
            tally_reply(&[unit_success("A")]),
        );

        ServiceCall::new(&transport, Tally::new(&["A"], ServiceErrorHandling::ThrowOnError))
            .execute()?;

        assert!(transport
            .last_request()
            .contains(r#"<t:RequestServerVersion Version="Exchange2010_SP2"/>"#));

        Ok(())
    }

    #[test]
    fn errors_are_collected_when_returning_errors() -> Result<(), Error> {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[
                unit_error("ErrorItemNotFound"),
                unit_success("B"),
                unit_error("ErrorAccessDenied"),
            ]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A", "B", "C"], ServiceErrorHandling::ReturnErrors),
        );
        let responses = call.execute()?;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses.overall_class(), ResponseClass::Error);

        let classes: Vec<_> = responses.iter().map(ResponseOutcome::class).collect();
        assert_eq!(
            classes,
            vec![
                ResponseClass::Error,
                ResponseClass::Success,
                ResponseClass::Error
            ]
        );
        assert_eq!(
            responses.get(0).and_then(ResponseOutcome::error_code),
            Some(&ResponseCode::ErrorItemNotFound)
        );
        assert_eq!(
            responses.get(2).and_then(ResponseOutcome::error_code),
            Some(&ResponseCode::ErrorAccessDenied)
        );

        Ok(())
    }

    #[test]
    fn first_error_fails_call_when_throwing() {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[
                unit_success("A"),
                unit_error("ErrorItemNotFound"),
                unit_error("ErrorAccessDenied"),
            ]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A", "B", "C"], ServiceErrorHandling::ThrowOnError),
        );

        match call.execute() {
            Err(Error::ResponseError { index, error }) => {
                assert_eq!(index, 1);
                assert_eq!(error.response_code, ResponseCode::ErrorItemNotFound);
                assert_eq!(error.message_text, "Unit failed.");
            }
            other => panic!("expected a response error, got {other:?}"),
        }
        assert_eq!(call.state(), CallState::Failed);
    }

    #[test]
    fn warnings_carry_code_and_payload() -> Result<(), Error> {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[warning_message(
                "TallyResponseMessage",
                "ErrorBatchProcessingStopped",
                "Stopped.",
            )]),
        );

        let responses =
            ServiceCall::new(&transport, Tally::new(&["A"], ServiceErrorHandling::ThrowOnError))
                .execute()?;

        match responses.get(0) {
            Some(ResponseOutcome::Warning { message, warning }) => {
                assert_eq!(message, &TallyResponseMessage { unit: None });
                assert_eq!(
                    warning.response_code,
                    ResponseCode::Other("ErrorBatchProcessingStopped".to_string())
                );
                assert_eq!(warning.message_text, "Stopped.");
            }
            other => panic!("expected a warning, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn failed_validation_sends_nothing() {
        let transport = MockTransport::new(ExchangeServerVersion::Exchange2013, String::new());

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A", ""], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Validation(ValidationError::InvalidParameter { name: "units", .. }))
        ));
        assert_eq!(call.state(), CallState::Failed);
        assert_eq!(transport.send_count(), 0);
    }

    #[test]
    fn version_gate_runs_before_operation_checks() {
        let transport = MockTransport::new(ExchangeServerVersion::Exchange2007_SP1, String::new());

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&[""], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Validation(ValidationError::UnsupportedServerVersion {
                operation: "Tally",
                required: ExchangeServerVersion::Exchange2010,
                negotiated: ExchangeServerVersion::Exchange2007_SP1,
            }))
        ));
        assert_eq!(transport.send_count(), 0);
    }

    #[test]
    fn operation_expecting_no_response_is_rejected() {
        let transport = MockTransport::new(ExchangeServerVersion::Exchange2013, String::new());

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&[], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Validation(ValidationError::NoResponseExpected { operation: "Tally" }))
        ));
        assert_eq!(transport.send_count(), 0);
    }

    #[test]
    fn too_few_responses_is_fatal_in_either_mode() {
        for error_handling in [
            ServiceErrorHandling::ThrowOnError,
            ServiceErrorHandling::ReturnErrors,
        ] {
            let transport = MockTransport::new(
                ExchangeServerVersion::Exchange2013,
                tally_reply(&[unit_success("A"), unit_success("B")]),
            );

            let mut call =
                ServiceCall::new(&transport, Tally::new(&["A", "B", "C"], error_handling));

            assert!(matches!(
                call.execute(),
                Err(Error::Protocol(ProtocolError::TooFewResponses {
                    expected: 3,
                    actual: 2
                }))
            ));
        }
    }

    #[test]
    fn too_many_responses_is_fatal() {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[unit_success("A"), unit_success("B")]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A"], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Protocol(ProtocolError::TooManyResponses { expected: 1 }))
        ));
    }

    #[test]
    fn wrong_message_element_is_fatal() {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[success_message("OtherResponseMessage", "")]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A"], ServiceErrorHandling::ReturnErrors),
        );

        match call.execute() {
            Err(Error::Protocol(ProtocolError::UnexpectedElement { expected, found })) => {
                assert_eq!(expected, "TallyResponseMessage");
                assert_eq!(found, "OtherResponseMessage");
            }
            other => panic!("expected an unexpected element error, got {other:?}"),
        }
    }

    #[test]
    fn send_failure_is_reported_as_is() {
        let transport = MockTransport::failing_send(ExchangeServerVersion::Exchange2013, || {
            TransportError::TimedOut
        });

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A"], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Transport(TransportError::TimedOut))
        ));
        assert_eq!(call.state(), CallState::Failed);
        assert_eq!(transport.send_count(), 1);
    }

    #[test]
    fn abort_mid_read_fails_call() {
        let reply = tally_reply(&[unit_success("A"), unit_success("B")]);
        let transport = MockTransport::failing_mid_read(
            ExchangeServerVersion::Exchange2013,
            reply.clone(),
            reply.len() / 2,
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A", "B"], ServiceErrorHandling::ReturnErrors),
        );

        assert!(matches!(
            call.execute(),
            Err(Error::Transport(TransportError::Io(_)))
        ));
        assert_eq!(call.state(), CallState::Failed);
    }

    #[test]
    fn oversized_response_is_rejected() {
        let reply = tally_reply(&[unit_success("A")]);
        let transport = MockTransport::new(ExchangeServerVersion::Exchange2013, reply.clone());

        let call = ServiceCall::new(
            &transport,
            Tally::new(&["A"], ServiceErrorHandling::ReturnErrors),
        );
        let mut call = call.with_options(RequestOptions {
            log_payloads: true,
            max_response_size: Some(reply.len() - 1),
        });

        assert!(matches!(
            call.execute(),
            Err(Error::Protocol(ProtocolError::ResponseTooLarge { .. }))
        ));
    }

    #[test]
    fn call_runs_only_once() -> Result<(), Error> {
        let transport = MockTransport::new(
            ExchangeServerVersion::Exchange2013,
            tally_reply(&[unit_success("A")]),
        );

        let mut call = ServiceCall::new(
            &transport,
            Tally::new(&["A"], ServiceErrorHandling::ReturnErrors),
        );
        assert!(!call.state().is_terminal());
        assert_eq!(call.operation().units, vec!["A"]);
        call.execute()?;
        assert!(call.state().is_terminal());

        assert!(matches!(
            call.execute(),
            Err(Error::InvalidCallState(CallState::Completed))
        ));
        assert_eq!(transport.send_count(), 1);

        Ok(())
    }

    fn not_found() -> ResponseError {
        ResponseError {
            response_code: ResponseCode::ErrorItemNotFound,
            message_text: String::new(),
            message_xml: None,
        }
    }

    #[test]
    fn correlator_discards_outcomes_on_error_when_throwing() {
        let mut correlator = ResponseCorrelator::new(ServiceErrorHandling::ThrowOnError, 3);
        assert_eq!(correlator.next_index(), Some(0));

        assert!(correlator.accept(ResponseOutcome::Success(1)).is_ok());
        assert_eq!(correlator.next_index(), Some(1));

        match correlator.accept(ResponseOutcome::Error(not_found())) {
            Err(Error::ResponseError { index: 1, error }) => assert_eq!(error, not_found()),
            other => panic!("expected a response error, got {other:?}"),
        }

        assert_eq!(correlator.received(), 0);
        assert_eq!(correlator.next_index(), None);
        assert!(matches!(
            correlator.finish(),
            Err(Error::InvalidCallState(CallState::Failed))
        ));
    }

    #[test]
    fn correlator_keeps_errors_when_returning_errors() {
        let mut correlator = ResponseCorrelator::new(ServiceErrorHandling::ReturnErrors, 2);

        assert!(correlator.accept(ResponseOutcome::Error(not_found())).is_ok());
        assert!(correlator.accept(ResponseOutcome::Success(2)).is_ok());
        assert_eq!(correlator.next_index(), None);
        assert!(matches!(
            correlator.accept(ResponseOutcome::Success(3)),
            Err(Error::Protocol(ProtocolError::TooManyResponses { expected: 2 }))
        ));

        let outcomes = correlator.finish().expect("all outcomes should be present");
        assert_eq!(
            outcomes,
            vec![ResponseOutcome::Error(not_found()), ResponseOutcome::Success(2)]
        );
    }

    #[test]
    fn correlator_reports_missing_outcomes() {
        let mut correlator = ResponseCorrelator::new(ServiceErrorHandling::ReturnErrors, 2);
        assert!(correlator.accept(ResponseOutcome::Success(())).is_ok());

        assert!(matches!(
            correlator.finish(),
            Err(Error::Protocol(ProtocolError::TooFewResponses {
                expected: 2,
                actual: 1
            }))
        ));
    }
}
