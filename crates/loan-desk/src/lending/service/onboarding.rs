use chrono::{DateTime, Utc};

use super::drafts::{AddressDraft, CustomerDraft, PartnerDraft, ProductDraft};
use super::{find_customer, LendingError, LendingService};
use crate::lending::access::{assign_partner_by_pincode, is_valid_pincode};
use crate::lending::domain::{
    Address, AddressId, Customer, CustomerId, KycStatus, LoanProduct, Partner, PartnerId,
    ProductId, RecordStatus,
};
use crate::lending::events::EventPublisher;
use crate::lending::store::LendingRepository;

/// Only well-formed six-digit codes survive; surrounding whitespace is dropped.
fn clean_pincodes(pincodes: Vec<String>) -> Vec<String> {
    pincodes
        .into_iter()
        .map(|pincode| pincode.trim().to_string())
        .filter(|pincode| is_valid_pincode(pincode))
        .collect()
}

fn require(value: &str, field: &str) -> Result<(), LendingError> {
    if value.trim().is_empty() {
        Err(LendingError::invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn validate_product(draft: &ProductDraft) -> Result<(), LendingError> {
    require(&draft.name, "product name")?;
    require(&draft.code, "product code")?;
    if draft.min_amount <= 0 || draft.min_amount > draft.max_amount {
        return Err(LendingError::invalid(
            "minimum amount must be positive and not exceed the maximum",
        ));
    }
    if draft.min_tenure_months == 0 || draft.min_tenure_months > draft.max_tenure_months {
        return Err(LendingError::invalid(
            "minimum tenure must be positive and not exceed the maximum",
        ));
    }
    if draft.interest_rate < 0.0 || draft.prepayment_penalty < 0.0 || draft.late_payment_penalty < 0.0
    {
        return Err(LendingError::invalid("rates cannot be negative"));
    }
    if draft.eligibility.min_age > draft.eligibility.max_age {
        return Err(LendingError::invalid("minimum age exceeds maximum age"));
    }
    Ok(())
}

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn create_partner(
        &self,
        draft: PartnerDraft,
        now: DateTime<Utc>,
    ) -> Result<Partner, LendingError> {
        require(&draft.name, "partner name")?;
        require(&draft.code, "partner code")?;
        let partner = self.mutate(|data| {
            if data.partners.iter().any(|p| p.code == draft.code) {
                return Err(LendingError::invalid(format!(
                    "partner code {} is already in use",
                    draft.code
                )));
            }
            let mut partner = Partner {
                id: PartnerId(0),
                name: draft.name,
                code: draft.code,
                status: RecordStatus::Active,
                servicing_pincodes: clean_pincodes(draft.servicing_pincodes),
                created_at: now,
                updated_at: now,
            };
            partner.id = data.insert_partner(partner.clone());
            Ok(partner)
        })?;
        tracing::info!(partner_id = %partner.id, code = %partner.code, "partner created");
        Ok(partner)
    }

    pub fn update_partner(
        &self,
        partner_id: PartnerId,
        draft: PartnerDraft,
        now: DateTime<Utc>,
    ) -> Result<Partner, LendingError> {
        require(&draft.name, "partner name")?;
        self.mutate(|data| {
            let partner = data
                .partners
                .iter_mut()
                .find(|partner| partner.id == partner_id)
                .ok_or_else(|| LendingError::not_found("partner", partner_id.0))?;
            partner.name = draft.name;
            partner.code = draft.code;
            partner.servicing_pincodes = clean_pincodes(draft.servicing_pincodes);
            partner.updated_at = now;
            Ok(partner.clone())
        })
    }

    pub fn toggle_partner_status(
        &self,
        partner_id: PartnerId,
        now: DateTime<Utc>,
    ) -> Result<Partner, LendingError> {
        self.mutate(|data| {
            let partner = data
                .partners
                .iter_mut()
                .find(|partner| partner.id == partner_id)
                .ok_or_else(|| LendingError::not_found("partner", partner_id.0))?;
            partner.status = partner.status.toggled();
            partner.updated_at = now;
            Ok(partner.clone())
        })
    }

    pub fn create_product(
        &self,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> Result<LoanProduct, LendingError> {
        validate_product(&draft)?;
        self.mutate(|data| {
            if data.products.iter().any(|p| p.code == draft.code) {
                return Err(LendingError::invalid(format!(
                    "product code {} is already in use",
                    draft.code
                )));
            }
            let mut product = product_from_draft(ProductId(0), draft, now);
            product.id = data.insert_product(product.clone());
            tracing::info!(product_id = %product.id, code = %product.code, "product created");
            Ok(product)
        })
    }

    pub fn update_product(
        &self,
        product_id: ProductId,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> Result<LoanProduct, LendingError> {
        validate_product(&draft)?;
        self.mutate(|data| {
            let product = data
                .products
                .iter_mut()
                .find(|product| product.id == product_id)
                .ok_or_else(|| LendingError::not_found("product", product_id.0))?;
            let mut updated = product_from_draft(product_id, draft, now);
            updated.status = product.status;
            updated.created_at = product.created_at;
            *product = updated.clone();
            Ok(updated)
        })
    }

    pub fn toggle_product_status(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<LoanProduct, LendingError> {
        self.mutate(|data| {
            let product = data
                .products
                .iter_mut()
                .find(|product| product.id == product_id)
                .ok_or_else(|| LendingError::not_found("product", product_id.0))?;
            product.status = product.status.toggled();
            product.updated_at = now;
            Ok(product.clone())
        })
    }

    /// Registers a customer and routes them to the partner servicing their pincode.
    /// KYC starts as `Pending`.
    pub fn onboard_customer(
        &self,
        draft: CustomerDraft,
        now: DateTime<Utc>,
    ) -> Result<Customer, LendingError> {
        require(&draft.name, "name")?;
        require(&draft.phone, "phone")?;
        let pincode = draft.pincode.trim().to_string();
        if !is_valid_pincode(&pincode) {
            return Err(LendingError::invalid("pincode must be exactly six digits"));
        }

        let customer = self.mutate(|data| {
            let partner_id = assign_partner_by_pincode(&pincode, &data.partners).map(|p| p.id);
            let mut customer = Customer {
                id: CustomerId(0),
                name: draft.name.trim().to_string(),
                phone: draft.phone.trim().to_string(),
                email: draft.email.trim().to_string(),
                dob: draft.dob,
                gender: draft.gender,
                guardian_name: draft.guardian_name,
                occupation: draft.occupation,
                income_source: draft.income_source,
                monthly_income: draft.monthly_income,
                kyc_status: KycStatus::Pending,
                pincode,
                partner_id,
                created_at: now,
            };
            customer.id = data.insert_customer(customer.clone());
            Ok(customer)
        })?;

        match customer.partner_id {
            Some(partner_id) => tracing::info!(
                customer_id = %customer.id,
                partner_id = %partner_id,
                "customer onboarded"
            ),
            None => tracing::warn!(
                customer_id = %customer.id,
                pincode = %customer.pincode,
                "customer onboarded without a servicing partner"
            ),
        }
        Ok(customer)
    }

    /// New addresses start unverified.
    pub fn add_address(
        &self,
        customer_id: CustomerId,
        draft: AddressDraft,
    ) -> Result<Address, LendingError> {
        require(&draft.line1, "address line")?;
        require(&draft.city, "city")?;
        if !is_valid_pincode(draft.pincode.trim()) {
            return Err(LendingError::invalid("pincode must be exactly six digits"));
        }
        self.mutate(|data| {
            find_customer(data, customer_id)?;
            let mut address = Address {
                id: AddressId(0),
                customer_id,
                kind: draft.kind,
                line1: draft.line1,
                line2: draft.line2,
                city: draft.city,
                state: draft.state,
                pincode: draft.pincode.trim().to_string(),
                is_verified: false,
                verification_date: None,
            };
            address.id = data.insert_address(address.clone());
            Ok(address)
        })
    }

    pub fn update_kyc_status(
        &self,
        customer_id: CustomerId,
        status: KycStatus,
    ) -> Result<Customer, LendingError> {
        let customer = self.mutate(|data| {
            let customer = data
                .customers
                .iter_mut()
                .find(|customer| customer.id == customer_id)
                .ok_or_else(|| LendingError::not_found("customer", customer_id.0))?;
            customer.kyc_status = status;
            Ok(customer.clone())
        })?;
        tracing::info!(customer_id = %customer_id, kyc = status.label(), "kyc status updated");
        Ok(customer)
    }
}

fn product_from_draft(id: ProductId, draft: ProductDraft, now: DateTime<Utc>) -> LoanProduct {
    LoanProduct {
        id,
        name: draft.name,
        code: draft.code,
        description: draft.description,
        category: draft.category,
        min_amount: draft.min_amount,
        max_amount: draft.max_amount,
        min_tenure_months: draft.min_tenure_months,
        max_tenure_months: draft.max_tenure_months,
        interest_rate: draft.interest_rate,
        processing_fee: draft.processing_fee,
        prepayment_penalty: draft.prepayment_penalty,
        late_payment_penalty: draft.late_payment_penalty,
        eligibility: draft.eligibility,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_pincodes_are_dropped() {
        let cleaned = clean_pincodes(vec![
            " 560001 ".to_string(),
            "5600".to_string(),
            "abcdef".to_string(),
            "400002".to_string(),
        ]);
        assert_eq!(cleaned, vec!["560001".to_string(), "400002".to_string()]);
    }
}
