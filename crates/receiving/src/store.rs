use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use certflow_certification::{CertificationService, MoveLineId, ServiceEvent, ServiceId};
use certflow_core::{Aggregate, DomainError, DomainResult, TenantId};
use certflow_events::EventEnvelope;

/// Persistence boundary for certification services.
///
/// Implementations append service events to a per-service stream and answer
/// the lookups the receiving workflow needs (a service is keyed by the move
/// line it certifies). The production implementation lives with the ERP's
/// transactional storage; the in-memory one below backs tests and dev.
pub trait ServiceStore: Send + Sync {
    /// Append events to a service stream.
    fn append(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
        events: Vec<ServiceEvent>,
    ) -> DomainResult<()>;

    /// Rehydrate a service from its stream, if it exists.
    fn load(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
    ) -> DomainResult<Option<CertificationService>>;

    /// The service certifying `move_line_id`, if one was ever generated.
    fn find_by_move_line(
        &self,
        tenant_id: TenantId,
        move_line_id: MoveLineId,
    ) -> DomainResult<Option<CertificationService>>;

    /// All services certifying any of `move_line_ids`.
    fn find_by_move_lines(
        &self,
        tenant_id: TenantId,
        move_line_ids: &[MoveLineId],
    ) -> DomainResult<Vec<CertificationService>>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    tenant_id: TenantId,
    service_id: ServiceId,
}

/// In-memory append-only service store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryServiceStore {
    streams: RwLock<HashMap<StreamKey, Vec<EventEnvelope<ServiceEvent>>>>,
    by_move_line: RwLock<HashMap<(TenantId, MoveLineId), ServiceId>>,
}

impl InMemoryServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rehydrate(
        service_id: ServiceId,
        stream: &[EventEnvelope<ServiceEvent>],
    ) -> CertificationService {
        let mut service = CertificationService::empty(service_id);
        for envelope in stream {
            service.apply(envelope.payload());
        }
        service
    }
}

impl ServiceStore for InMemoryServiceStore {
    fn append(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
        events: Vec<ServiceEvent>,
    ) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::conflict("service store lock poisoned"))?;
        let mut by_move_line = self
            .by_move_line
            .write()
            .map_err(|_| DomainError::conflict("service store lock poisoned"))?;

        let key = StreamKey {
            tenant_id,
            service_id,
        };
        let stream = streams.entry(key).or_default();
        let mut next = stream.len() as u64 + 1;

        for event in events {
            if let ServiceEvent::ServiceCreated(e) = &event {
                by_move_line.insert((tenant_id, e.move_line_id), service_id);
            }
            stream.push(EventEnvelope::new(
                Uuid::now_v7(),
                tenant_id,
                service_id.0,
                "certification.service",
                next,
                event,
            ));
            next += 1;
        }

        Ok(())
    }

    fn load(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
    ) -> DomainResult<Option<CertificationService>> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::conflict("service store lock poisoned"))?;

        let key = StreamKey {
            tenant_id,
            service_id,
        };
        Ok(streams
            .get(&key)
            .map(|stream| Self::rehydrate(service_id, stream)))
    }

    fn find_by_move_line(
        &self,
        tenant_id: TenantId,
        move_line_id: MoveLineId,
    ) -> DomainResult<Option<CertificationService>> {
        let service_id = {
            let by_move_line = self
                .by_move_line
                .read()
                .map_err(|_| DomainError::conflict("service store lock poisoned"))?;
            by_move_line.get(&(tenant_id, move_line_id)).copied()
        };

        match service_id {
            Some(service_id) => self.load(tenant_id, service_id),
            None => Ok(None),
        }
    }

    fn find_by_move_lines(
        &self,
        tenant_id: TenantId,
        move_line_ids: &[MoveLineId],
    ) -> DomainResult<Vec<CertificationService>> {
        let mut services = Vec::new();
        for move_line_id in move_line_ids {
            if let Some(service) = self.find_by_move_line(tenant_id, *move_line_id)? {
                services.push(service);
            }
        }
        Ok(services)
    }
}

impl<S> ServiceStore for std::sync::Arc<S>
where
    S: ServiceStore + ?Sized,
{
    fn append(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
        events: Vec<ServiceEvent>,
    ) -> DomainResult<()> {
        (**self).append(tenant_id, service_id, events)
    }

    fn load(
        &self,
        tenant_id: TenantId,
        service_id: ServiceId,
    ) -> DomainResult<Option<CertificationService>> {
        (**self).load(tenant_id, service_id)
    }

    fn find_by_move_line(
        &self,
        tenant_id: TenantId,
        move_line_id: MoveLineId,
    ) -> DomainResult<Option<CertificationService>> {
        (**self).find_by_move_line(tenant_id, move_line_id)
    }

    fn find_by_move_lines(
        &self,
        tenant_id: TenantId,
        move_line_ids: &[MoveLineId],
    ) -> DomainResult<Vec<CertificationService>> {
        (**self).find_by_move_lines(tenant_id, move_line_ids)
    }
}
