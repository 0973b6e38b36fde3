use std::net::SocketAddr;
use std::time::Duration;

use resolv_net::{Agent, AgentError, AgentFactory, AgentParams, Shutdown, Transport};
use resolv_proto::{DnsClass, DnsPacket, Header, Name, Question, QueryType, Record, ResponseCode};

use crate::outcome::{Answers, ErrorKind, LogEntry, LogEvent, Outcome, ResolveError};
use crate::options::ResolveOptions;
use crate::Resolver;

enum AttemptOutcome {
    Responded(DnsPacket),
    Timeout,
    Error(AgentError),
    Cancelled,
}

fn build_message(id: u16, question: &Question, class: DnsClass, recursion_desired: bool) -> DnsPacket {
    let mut header = Header::question(id);
    header.recursion_desired = recursion_desired;
    DnsPacket {
        header,
        questions: vec![Question {
            name: question.name.clone(),
            qtype: question.qtype,
            qclass: class,
        }],
        ..Default::default()
    }
}

fn cancelled(log: &[LogEntry]) -> ResolveError {
    ResolveError::new(ErrorKind::Cancelled, "query was cancelled", log.to_vec())
}

/// Connects, sends, and races the response against the agent's timeout and
/// the query's shutdown signal. Closes the agent on every exit path.
async fn send_and_wait(
    factory: &dyn resolv_net::AgentFactory,
    params: &AgentParams,
    transport: Transport,
    message: &mut DnsPacket,
    udp_buffer_bytes: usize,
    shutdown: &mut Shutdown,
) -> AttemptOutcome {
    let mut agent = match factory.connect(params.addr, transport, udp_buffer_bytes).await {
        Ok(agent) => agent,
        Err(err) => return AttemptOutcome::Error(err),
    };

    if let Err(err) = agent.send_query(message).await {
        agent.close();
        return AttemptOutcome::Error(err);
    }

    let outcome = tokio::select! {
        resp = agent.recv_response() => match resp {
            Ok(packet) => AttemptOutcome::Responded(packet),
            Err(err) => AttemptOutcome::Error(err),
        },
        _ = tokio::time::sleep(params.timeout) => AttemptOutcome::Timeout,
        _ = shutdown.triggered() => AttemptOutcome::Cancelled,
    };
    agent.close();
    outcome
}

fn log_attempt(log: &mut Vec<LogEntry>, params: &AgentParams, transport: Transport, outcome: &AttemptOutcome) {
    let event = match outcome {
        AttemptOutcome::Responded(resp) if resp.header.truncated_message => LogEvent::Truncated,
        AttemptOutcome::Responded(resp) => LogEvent::Responded {
            rcode: resp.header.response_code,
        },
        AttemptOutcome::Timeout => LogEvent::Timeout,
        AttemptOutcome::Error(err) => LogEvent::Error(err.to_string()),
        AttemptOutcome::Cancelled => LogEvent::Error("cancelled".to_string()),
    };
    log.push(LogEntry {
        agent: params.name.clone(),
        transport,
        event,
    });
}

/// Sends `message`, and if the response comes back truncated over UDP,
/// promotes to TCP against the *same* upstream and resends the identical
/// message -- without consuming another agent from the caller's list.
async fn attempt_with_promotion(
    factory: &dyn resolv_net::AgentFactory,
    params: &AgentParams,
    initial_transport: Transport,
    message: &mut DnsPacket,
    udp_buffer_bytes: usize,
    shutdown: &mut Shutdown,
    log: &mut Vec<LogEntry>,
) -> AttemptOutcome {
    let first = send_and_wait(factory, params, initial_transport, message, udp_buffer_bytes, shutdown).await;
    log_attempt(log, params, initial_transport, &first);

    match first {
        AttemptOutcome::Responded(resp) if resp.header.truncated_message && initial_transport == Transport::Udp => {
            let second = send_and_wait(factory, params, Transport::Tcp, message, udp_buffer_bytes, shutdown).await;
            log_attempt(log, params, Transport::Tcp, &second);
            second
        }
        other => other,
    }
}

fn soa_minimum(records: &[Record]) -> Option<u32> {
    records.iter().find_map(|r| match r {
        Record::SOA { minimum, .. } => Some(*minimum),
        _ => None,
    })
}

async fn ingest(resolver: &Resolver, resp: &DnsPacket, class: DnsClass) {
    resolver.cache.put_many(resp.answers.iter().cloned(), class).await;
    resolver.cache.put_many(resp.authorities.iter().cloned(), class).await;
    resolver.cache.put_many(resp.resources.iter().cloned(), class).await;
}

/// Entry point shared by the public API and by inner NS-resolution queries:
/// consults the cache, then dispatches to forwarding or recursive walking.
pub(crate) async fn execute(
    resolver: &Resolver,
    question: Question,
    class: DnsClass,
    mut opts: ResolveOptions,
    mut shutdown: Shutdown,
) -> Outcome {
    let mut log = Vec::new();

    if opts.use_cache {
        let (records, fresh) = resolver.cache.get(&question.name, question.qtype, class).await;
        if fresh {
            log.push(LogEntry {
                agent: "cache".to_string(),
                transport: opts.initial_transport,
                event: LogEvent::CacheHit,
            });
            return Ok(Answers {
                answers: records,
                authorities: Vec::new(),
                additional: Vec::new(),
                log,
            });
        }
        if let Some(rcode) = resolver.cache.get_negative(&question.name, class).await {
            log.push(LogEntry {
                agent: "cache".to_string(),
                transport: opts.initial_transport,
                event: LogEvent::CacheHit,
            });
            return Err(ResolveError::new(
                ErrorKind::NameError,
                format!("{rcode:?} cached for {}", question.name),
                log,
            ));
        }
    }

    if opts.upstreams.is_empty() {
        if !opts.recursive {
            opts.recursive = true;
        }
        opts.upstreams = crate::roots::root_hints();
    }

    if opts.recursive {
        run_recursive(resolver, question, class, opts, &mut shutdown, log).await
    } else {
        run_forwarding(resolver, question, class, opts, &mut shutdown, log).await
    }
}

async fn run_forwarding(
    resolver: &Resolver,
    question: Question,
    class: DnsClass,
    opts: ResolveOptions,
    shutdown: &mut Shutdown,
    mut log: Vec<LogEntry>,
) -> Outcome {
    let mut agents = opts.upstreams;
    agents.sort_by_key(|a| a.priority);

    let qid: u16 = rand::random();
    let mut last_rcode = None;
    let timeout = opts.effective_timeout();

    for mut params in agents {
        if shutdown.is_triggered() {
            return Err(cancelled(&log));
        }
        params.timeout = params.timeout.min(timeout);
        let mut message = build_message(qid, &question, class, true);
        match attempt_with_promotion(
            resolver.agent_factory.as_ref(),
            &params,
            opts.initial_transport,
            &mut message,
            resolver.udp_buffer_bytes,
            shutdown,
            &mut log,
        )
        .await
        {
            AttemptOutcome::Cancelled => return Err(cancelled(&log)),
            AttemptOutcome::Timeout | AttemptOutcome::Error(_) => continue,
            AttemptOutcome::Responded(resp) => match resp.header.response_code {
                ResponseCode::NoError => {
                    if opts.use_cache {
                        ingest(resolver, &resp, class).await;
                    }
                    return Ok(Answers {
                        answers: resp.answers,
                        authorities: resp.authorities,
                        additional: resp.resources,
                        log,
                    });
                }
                ResponseCode::NameError => {
                    if opts.use_cache {
                        resolver
                            .cache
                            .put_negative(&question.name, class, ResponseCode::NameError, soa_minimum(&resp.authorities))
                            .await;
                    }
                    return Err(ResolveError::new(ErrorKind::NameError, "authoritative NXDOMAIN", log));
                }
                other => {
                    last_rcode = Some(other);
                    continue;
                }
            },
        }
    }

    match last_rcode {
        Some(rcode) => Err(ResolveError::new(
            ErrorKind::ServerError { rcode },
            "every upstream returned a non-OK rcode",
            log,
        )),
        None => Err(ResolveError::new(ErrorKind::Timeout, "no upstream responded in time", log)),
    }
}

fn ns_glue(resp: &DnsPacket, ns_name: &Name) -> Option<SocketAddr> {
    resp.resources.iter().find_map(|r| match r {
        Record::A { domain, addr, .. } if domain == ns_name => Some(SocketAddr::from((*addr, 53))),
        _ => None,
    })
}

async fn run_recursive(
    resolver: &Resolver,
    mut question: Question,
    class: DnsClass,
    opts: ResolveOptions,
    shutdown: &mut Shutdown,
    mut log: Vec<LogEntry>,
) -> Outcome {
    let mut agents = opts.upstreams;
    agents.sort_by_key(|a| a.priority);
    let mut hops = 0usize;

    'walk: loop {
        if agents.is_empty() {
            return Err(ResolveError::new(ErrorKind::Timeout, "no delegation candidates remain", log));
        }

        let mut responded = None;
        for params in agents.drain(..) {
            if shutdown.is_triggered() {
                return Err(cancelled(&log));
            }
            let qid: u16 = rand::random();
            let mut message = build_message(qid, &question, class, false);
            match attempt_with_promotion(
                resolver.agent_factory.as_ref(),
                &params,
                Transport::Udp,
                &mut message,
                resolver.udp_buffer_bytes,
                shutdown,
                &mut log,
            )
            .await
            {
                AttemptOutcome::Cancelled => return Err(cancelled(&log)),
                AttemptOutcome::Timeout | AttemptOutcome::Error(_) => continue,
                // A server-side failure is no more useful than a timeout: try
                // the next delegation candidate instead of completing on it.
                AttemptOutcome::Responded(resp)
                    if matches!(
                        resp.header.response_code,
                        ResponseCode::ServerFailure
                            | ResponseCode::Refused
                            | ResponseCode::NotImplemented
                            | ResponseCode::FormatError
                    ) =>
                {
                    continue
                }
                AttemptOutcome::Responded(resp) => {
                    responded = Some(resp);
                    break;
                }
            }
        }

        let Some(resp) = responded else {
            return Err(ResolveError::new(ErrorKind::Timeout, "no delegation candidate answered", log));
        };

        if resp.header.response_code == ResponseCode::NameError && resp.header.authoritative_answer {
            if opts.use_cache {
                resolver
                    .cache
                    .put_negative(&question.name, class, ResponseCode::NameError, soa_minimum(&resp.authorities))
                    .await;
            }
            return Err(ResolveError::new(ErrorKind::NameError, "authoritative NXDOMAIN", log));
        }

        let direct: Vec<Record> = resp
            .answers
            .iter()
            .filter(|r| r.domain() == &question.name && r.qtype() == question.qtype)
            .cloned()
            .collect();
        if !direct.is_empty() {
            if opts.use_cache {
                ingest(resolver, &resp, class).await;
            }
            return Ok(Answers {
                answers: direct,
                authorities: resp.authorities,
                additional: resp.resources,
                log,
            });
        }

        if let Some(target) = resp.answers.iter().find_map(|r| match r {
            Record::CNAME { domain, host, .. } if domain == &question.name => Some(host.clone()),
            _ => None,
        }) {
            hops += 1;
            if hops > resolver.max_cname_chain {
                return Err(ResolveError::new(ErrorKind::NoData, "cname chain too long", log));
            }
            if opts.use_cache {
                ingest(resolver, &resp, class).await;
            }
            log.push(LogEntry {
                agent: "resolver".to_string(),
                transport: Transport::Udp,
                event: LogEvent::CnameFollowed { to: target.to_string() },
            });
            question = Question {
                name: target,
                qtype: question.qtype,
                qclass: class,
            };
            agents = crate::roots::root_hints();
            continue 'walk;
        }

        let ns_names: Vec<Name> = resp
            .authorities
            .iter()
            .filter_map(|r| match r {
                Record::NS { host, .. } => Some(host.clone()),
                _ => None,
            })
            .collect();

        if !ns_names.is_empty() {
            log.push(LogEntry {
                agent: "resolver".to_string(),
                transport: Transport::Udp,
                event: LogEvent::Referral {
                    to: ns_names[0].to_string(),
                },
            });

            let mut next_agents = Vec::new();
            let mut glueless = Vec::new();
            for (priority, ns_name) in ns_names.iter().enumerate() {
                if let Some(addr) = ns_glue(&resp, ns_name) {
                    next_agents.push(AgentParams::new(addr, Duration::from_millis(2000), priority as u8, ns_name.to_string()));
                } else {
                    glueless.push((priority, ns_name.clone()));
                }
            }

            // Name servers without glue in this response each need their own
            // nested A-record lookup; nothing ties one to another, so they
            // run concurrently rather than one at a time.
            if !glueless.is_empty() {
                use futures::stream::{self, StreamExt};
                let resolved: Vec<(usize, Name, Outcome)> = stream::iter(glueless)
                    .map(|(priority, ns_name)| {
                        let inner_question = Question {
                            name: ns_name.clone(),
                            qtype: QueryType::A,
                            qclass: class,
                        };
                        async move {
                            let result = crate::resolve_inner(resolver, inner_question, class).await;
                            (priority, ns_name, result)
                        }
                    })
                    .buffer_unordered(8)
                    .collect()
                    .await;

                for (priority, ns_name, result) in resolved {
                    match result {
                        Ok(answers) => {
                            log.extend(answers.log.iter().cloned());
                            if let Some(addr) = answers.answers.iter().find_map(|r| match r {
                                Record::A { addr, .. } => Some(*addr),
                                _ => None,
                            }) {
                                next_agents.push(AgentParams::new(
                                    SocketAddr::from((addr, 53)),
                                    Duration::from_millis(2000),
                                    priority as u8,
                                    ns_name.to_string(),
                                ));
                            }
                        }
                        Err(err) => log.extend(err.log.iter().cloned()),
                    }
                }
            }

            if next_agents.is_empty() {
                return Err(ResolveError::new(ErrorKind::NoData, "referral produced no reachable name server", log));
            }
            agents = next_agents;
            continue 'walk;
        }

        return Err(ResolveError::new(ErrorKind::NoData, "name exists but has no matching records", log));
    }
}
